//! # Label module
//!
//! Module dedicated to message labels. A label is a tag-like
//! classification attached to a message, distinct from its folder
//! location on providers that support multiple labels per message
//! (Gmail exposes them through the `X-GM-LABELS` extension).
//!
//! The main entity is the [`LabelSpec`]: a label name prefixed with
//! an optional sign, as given on the command line.

use std::{convert::Infallible, fmt, str::FromStr};

/// The Inbox system label.
pub const INBOX: &str = "\\Inbox";

/// The Trash system label.
pub const TRASH: &str = "\\Trash";

/// The action sign of a label or flag specification.
///
/// An unprefixed specification defaults to [`Sign::Add`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Sign {
    /// The label or flag should be added to matching messages.
    #[default]
    Add,

    /// The label or flag should be removed from matching messages.
    Remove,
}

impl Sign {
    /// Strips a leading `+` or `-` from the given token and returns
    /// the sign it stands for together with the remainder.
    pub fn split_token(token: &str) -> (Sign, &str) {
        match token.strip_prefix('-') {
            Some(rest) => (Sign::Remove, rest),
            None => (Sign::Add, token.strip_prefix('+').unwrap_or(token)),
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Add => write!(f, "+"),
            Sign::Remove => write!(f, "-"),
        }
    }
}

/// The label specification.
///
/// A label name together with the sign saying whether the label
/// should be added to or removed from matching messages. Parsing
/// never fails: any token is a valid label name once its optional
/// sign is stripped.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LabelSpec {
    pub sign: Sign,
    pub name: String,
}

impl LabelSpec {
    pub fn new(sign: Sign, name: impl ToString) -> Self {
        Self {
            sign,
            name: name.to_string(),
        }
    }

    pub fn is_add(&self) -> bool {
        self.sign == Sign::Add
    }

    pub fn is_remove(&self) -> bool {
        self.sign == Sign::Remove
    }
}

impl From<&str> for LabelSpec {
    fn from(token: &str) -> Self {
        let (sign, name) = Sign::split_token(token);
        Self::new(sign, name)
    }
}

impl FromStr for LabelSpec {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Infallible> {
        Ok(token.into())
    }
}

impl fmt::Display for LabelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sign, self.name)
    }
}
