//! # Envelope module
//!
//! Module dedicated to email envelopes: the lightweight header
//! summary (subject, addresses, Message-ID) fetched for the show
//! action, together with the message label set.

pub mod imap;

use std::{
    fmt,
    io::{self, Write},
    ops::{Deref, DerefMut},
};

/// The email envelope address.
///
/// An address is composed of an optional display name and an email
/// address.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Address {
    pub name: Option<String>,
    pub addr: String,
}

impl Address {
    /// Builds a new address from an optional display name and an
    /// email address.
    pub fn new(name: Option<impl ToString>, addr: impl ToString) -> Self {
        Self {
            name: name.map(|name| name.to_string()),
            addr: addr.to_string(),
        }
    }

    /// Builds a new address from an email address only.
    pub fn new_nameless(addr: impl ToString) -> Self {
        Self::new(Option::<String>::None, addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.addr),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// The email envelope.
///
/// Everything the show action prints for one message: the UID, the
/// subject, the populated header address lists, the Message-ID and
/// the label set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Envelope {
    /// The message UID within its folder.
    pub uid: u32,

    /// The subject, empty when the message has none.
    pub subject: String,

    pub from: Vec<Address>,
    pub reply_to: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,

    /// The Message-ID header, including angle brackets.
    pub message_id: Option<String>,

    /// The labels attached to the message.
    pub labels: Vec<String>,
}

impl Envelope {
    /// Writes the envelope in the show format: a `UID: subject`
    /// header line, then every populated header field indented, then
    /// the label set, then a blank separator line.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{:04}: {}", self.uid, self.subject)?;

        let headers = [
            ("From", &self.from),
            ("Reply to", &self.reply_to),
            ("To", &self.to),
            ("Cc", &self.cc),
        ];

        for (header, addrs) in headers {
            if addrs.is_empty() {
                continue;
            }
            writeln!(out, "      {header}: {}", join_addresses(addrs))?;
        }

        if let Some(id) = &self.message_id {
            writeln!(out, "      Message ID: {id}")?;
        }

        writeln!(out, "      Labels: {}", self.labels.join(" "))?;
        writeln!(out)
    }
}

fn join_addresses(addrs: &[Address]) -> String {
    addrs.iter().fold(String::new(), |mut joined, addr| {
        if !joined.is_empty() {
            joined.push_str(", ");
        }
        joined.push_str(&addr.to_string());
        joined
    })
}

/// The ordered list of envelopes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Envelopes(Vec<Envelope>);

impl Envelopes {
    /// Sorts envelopes by ascending UID, the order the show action
    /// prints them in regardless of the fetch response order.
    pub fn sort_by_uid(&mut self) {
        self.0.sort_by_key(|envelope| envelope.uid);
    }
}

impl Deref for Envelopes {
    type Target = Vec<Envelope>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Envelopes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for Envelopes {
    type Item = Envelope;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Envelope> for Envelopes {
    fn from_iter<T: IntoIterator<Item = Envelope>>(iter: T) -> Self {
        Envelopes(iter.into_iter().collect())
    }
}
