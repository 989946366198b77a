//! Module dedicated to the blocking IMAP session.
//!
//! This module contains the [`MailSession`] implementation based on
//! the [imap] crate: TLS via [native_tls], folder names encoded with
//! [utf7_imap], labels via the Gmail `X-GM-EXT-1` extension when the
//! server advertises it.

use std::{
    collections::HashMap,
    io::{Read, Write},
    net::TcpStream,
};

use imap::types::NameAttribute;
use tracing::debug;
use utf7_imap::{decode_utf7_imap as decode_utf7, encode_utf7_imap as encode_utf7};

use super::{Error, MailSession, Result, Uid};
use crate::{
    account::AccountConfig,
    envelope::{Envelope, Envelopes},
    flag::Flag,
};

/// The blocking IMAP session.
pub struct ImapSession<S: Read + Write> {
    session: imap::Session<S>,

    /// Whether the server advertises the Gmail extension
    /// (`X-GM-EXT-1`): labels and raw Gmail search queries depend on
    /// it.
    gmail_ext: bool,
}

/// Connects and logs in to the IMAP server of the given account,
/// over TLS unless the account disables it.
pub fn connect(account: &AccountConfig, debug: bool) -> Result<Box<dyn MailSession>> {
    let host = account.host.as_str();
    let port = account.imap_port();

    if account.ssl {
        let tls = native_tls::TlsConnector::builder().build()?;
        let client = imap::connect((host, port), host, &tls)
            .map_err(|err| Error::ConnectImapError(err, host.to_owned(), port))?;
        Ok(Box::new(login(client, account, debug)?))
    } else {
        let tcp = TcpStream::connect((host, port))
            .map_err(|err| Error::ConnectTcpError(err, host.to_owned(), port))?;
        let client = imap::Client::new(tcp);
        Ok(Box::new(login(client, account, debug)?))
    }
}

fn login<S: Read + Write + 'static>(
    client: imap::Client<S>,
    account: &AccountConfig,
    debug: bool,
) -> Result<ImapSession<S>> {
    let mut session = client
        .login(&account.username, &account.password)
        .map_err(|(err, _client)| Error::LoginImapError(err, account.username.clone()))?;

    session.debug = debug;

    let gmail_ext = session
        .capabilities()
        .map_err(Error::GetCapabilitiesImapError)?
        .has_str("X-GM-EXT-1");
    debug!("gmail extension advertised: {gmail_ext}");

    Ok(ImapSession { session, gmail_ext })
}

impl<S: Read + Write> ImapSession<S> {
    fn store(&mut self, uids: &[Uid], query: String) -> Result<()> {
        let _ = self
            .session
            .uid_store(uid_set(uids), &query)
            .map_err(|err| Error::StoreImapError(err, query.clone()))?;
        Ok(())
    }

    fn search(&mut self, query: &str) -> Result<Vec<Uid>> {
        let uids = self
            .session
            .uid_search(query)
            .map_err(Error::SearchUidsImapError)?;

        let mut uids: Vec<Uid> = uids.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }
}

impl<S: Read + Write> MailSession for ImapSession<S> {
    fn list_folders(&mut self) -> Result<Vec<String>> {
        let names = self
            .session
            .list(None, Some("*"))
            .map_err(Error::ListFoldersImapError)?;

        Ok(names
            .iter()
            .filter(|name| !name.attributes().contains(&NameAttribute::NoSelect))
            .map(|name| decode_utf7(name.name().to_string()))
            .collect())
    }

    fn select_folder(&mut self, folder: &str) -> Result<()> {
        let folder_encoded = encode_utf7(folder.to_string());
        debug!("utf7 encoded folder: {folder_encoded}");

        let _ = self
            .session
            .select(&folder_encoded)
            .map_err(|err| Error::SelectFolderImapError(err, folder.to_owned()))?;
        Ok(())
    }

    fn search_all(&mut self) -> Result<Vec<Uid>> {
        self.search("ALL")
    }

    fn search_query(&mut self, query: &str) -> Result<Vec<Uid>> {
        if self.gmail_ext {
            self.search(&format!("X-GM-RAW {}", quote(query)))
        } else {
            // non-Gmail servers get the query as raw IMAP search
            // criteria
            self.search(query)
        }
    }

    fn add_flags(&mut self, uids: &[Uid], flags: &[Flag]) -> Result<()> {
        self.store(uids, format!("+FLAGS ({})", flags_query(flags)))
    }

    fn remove_flags(&mut self, uids: &[Uid], flags: &[Flag]) -> Result<()> {
        self.store(uids, format!("-FLAGS ({})", flags_query(flags)))
    }

    fn add_labels(&mut self, uids: &[Uid], labels: &[String]) -> Result<()> {
        self.store(uids, format!("+X-GM-LABELS ({})", labels_query(labels)))
    }

    fn remove_labels(&mut self, uids: &[Uid], labels: &[String]) -> Result<()> {
        self.store(uids, format!("-X-GM-LABELS ({})", labels_query(labels)))
    }

    fn delete_messages(&mut self, uids: &[Uid]) -> Result<()> {
        self.add_flags(uids, &[Flag::Deleted])
    }

    fn expunge(&mut self) -> Result<()> {
        let _ = self.session.expunge().map_err(Error::ExpungeImapError)?;
        Ok(())
    }

    fn fetch_envelopes(&mut self, uids: &[Uid]) -> Result<Envelopes> {
        let seq = uid_set(uids);

        let fetches = self
            .session
            .uid_fetch(&seq, "(UID ENVELOPE)")
            .map_err(Error::FetchEnvelopesImapError)?;

        let mut envelopes: Envelopes =
            fetches.iter().filter_map(Envelope::from_imap_fetch).collect();

        // labels come from a separate round trip: the fetch response
        // parser of the imap crate does not know the X-GM-LABELS item
        if self.gmail_ext {
            let response = self
                .session
                .run_command_and_read_response(&format!("UID FETCH {seq} (X-GM-LABELS)"))
                .map_err(Error::FetchLabelsImapError)?;

            let labels_by_uid = parse_gm_labels_response(&response);
            for envelope in envelopes.iter_mut() {
                if let Some(labels) = labels_by_uid.get(&envelope.uid) {
                    envelope.labels = labels.clone();
                }
            }
        }

        Ok(envelopes)
    }

    fn logout(&mut self) -> Result<()> {
        self.session.logout().map_err(Error::LogoutImapError)
    }
}

/// Formats a UID chunk as an IMAP sequence set.
pub(crate) fn uid_set(uids: &[Uid]) -> String {
    uids.iter().fold(String::new(), |mut set, uid| {
        if !set.is_empty() {
            set.push(',');
        }
        set.push_str(&uid.to_string());
        set
    })
}

fn flags_query(flags: &[Flag]) -> String {
    flags.iter().fold(String::new(), |mut query, flag| {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(flag.to_imap_query());
        query
    })
}

fn labels_query(labels: &[String]) -> String {
    labels.iter().fold(String::new(), |mut query, label| {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(&encode_label(label));
        query
    })
}

/// Encodes a label for a `X-GM-LABELS` store: system labels like
/// `\Trash` stay bare atoms, everything else gets quoted.
fn encode_label(label: &str) -> String {
    let is_system = label.starts_with('\\')
        && label.len() > 1
        && label[1..].chars().all(|c| c.is_ascii_alphanumeric());

    if is_system {
        label.to_string()
    } else {
        quote(label)
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Parses the untagged responses of a `UID FETCH .. (X-GM-LABELS)`
/// command into a UID to labels map.
///
/// Lines look like `* 23 FETCH (X-GM-LABELS (\Inbox "Foo Bar") UID
/// 50)`, the UID item sitting before or after the labels list.
fn parse_gm_labels_response(response: &[u8]) -> HashMap<Uid, Vec<String>> {
    let mut labels_by_uid = HashMap::new();
    let text = String::from_utf8_lossy(response);

    for line in text.lines() {
        let line = line.trim();
        if !line.starts_with('*') {
            continue;
        }

        let Some(labels_start) = line.find("X-GM-LABELS (") else {
            continue;
        };
        let inner_start = labels_start + "X-GM-LABELS (".len();
        let Some(inner) = parenthesized(&line[inner_start..]) else {
            debug!("skipping unbalanced labels response line: {line}");
            continue;
        };

        let before = &line[..labels_start];
        let after = &line[inner_start + inner.len()..];
        let Some(uid) = find_uid_item(before).or_else(|| find_uid_item(after)) else {
            debug!("skipping labels response line without uid: {line}");
            continue;
        };

        labels_by_uid.insert(uid, tokenize_labels(inner));
    }

    labels_by_uid
}

/// Returns the content up to the closing parenthesis matching an
/// already-open one, quoted strings taken into account.
fn parenthesized(s: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..i]);
                }
            }
            _ => (),
        }
    }

    None
}

fn find_uid_item(part: &str) -> Option<Uid> {
    let mut tokens = part
        .split(|c: char| c.is_ascii_whitespace() || c == '(' || c == ')')
        .filter(|token| !token.is_empty());

    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("UID") {
            return tokens.next()?.parse().ok();
        }
    }

    None
}

/// Splits a labels list into label names: bare atoms and quoted
/// strings with `\\` and `\"` escapes.
fn tokenize_labels(inner: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_whitespace() {
            continue;
        }

        let mut label = String::new();

        if c == '"' {
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            label.push(escaped);
                        }
                    }
                    '"' => break,
                    c => label.push(c),
                }
            }
        } else {
            label.push(c);
            while let Some(&c) = chars.peek() {
                if c.is_ascii_whitespace() {
                    break;
                }
                label.push(c);
                chars.next();
            }
        }

        labels.push(label);
    }

    labels
}
