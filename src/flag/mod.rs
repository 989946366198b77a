//! # Flag module
//!
//! Module dedicated to message flags. A flag is a protocol-defined
//! message state bit. Unlike labels, the set of flags is finite and
//! fixed by the protocol, so parsing validates tokens against it.

use std::{fmt, result, str::FromStr};

use thiserror::Error;

use crate::label::Sign;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse flag {0}: not a valid IMAP flag")]
    ParseFlagError(String),
}

/// The message flag.
///
/// One of the fixed set of IMAP system flags. Arbitrary keywords are
/// deliberately not supported here: free-form classification goes
/// through labels instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Flag {
    /// The message has been read.
    Seen,

    /// The message has been answered.
    Answered,

    /// The message is marked for urgent or special attention.
    Flagged,

    /// The message is marked for removal by a later expunge.
    Deleted,

    /// The message is not complete yet.
    Draft,

    /// The message recently arrived in the folder.
    Recent,
}

impl Flag {
    /// All flags a specification token is validated against.
    pub const ALL: [Flag; 6] = [
        Flag::Seen,
        Flag::Answered,
        Flag::Flagged,
        Flag::Deleted,
        Flag::Draft,
        Flag::Recent,
    ];

    /// Returns the flag in its IMAP wire form, as used inside a
    /// `STORE x FLAGS (..)` list.
    pub fn to_imap_query(&self) -> &'static str {
        match self {
            Flag::Seen => "\\Seen",
            Flag::Answered => "\\Answered",
            Flag::Flagged => "\\Flagged",
            Flag::Deleted => "\\Deleted",
            Flag::Draft => "\\Draft",
            Flag::Recent => "\\Recent",
        }
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            seen if seen.eq_ignore_ascii_case("seen") => Ok(Flag::Seen),
            answered if answered.eq_ignore_ascii_case("answered") => Ok(Flag::Answered),
            flagged if flagged.eq_ignore_ascii_case("flagged") => Ok(Flag::Flagged),
            deleted if deleted.eq_ignore_ascii_case("deleted") => Ok(Flag::Deleted),
            draft if draft.eq_ignore_ascii_case("draft") => Ok(Flag::Draft),
            recent if recent.eq_ignore_ascii_case("recent") => Ok(Flag::Recent),
            unknown => Err(Error::ParseFlagError(unknown.to_string())),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = match self {
            Flag::Seen => "seen",
            Flag::Answered => "answered",
            Flag::Flagged => "flagged",
            Flag::Deleted => "deleted",
            Flag::Draft => "draft",
            Flag::Recent => "recent",
        };
        write!(f, "{flag}")
    }
}

/// The flag specification.
///
/// Similar to [`crate::label::LabelSpec`], except that the value is
/// validated against the fixed [`Flag`] set (case-insensitively) and
/// invalid tokens are rejected at parse time, before any connection
/// is made.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FlagSpec {
    pub sign: Sign,
    pub flag: Flag,
}

impl FlagSpec {
    pub fn new(sign: Sign, flag: Flag) -> Self {
        Self { sign, flag }
    }

    pub fn is_add(&self) -> bool {
        self.sign == Sign::Add
    }

    pub fn is_remove(&self) -> bool {
        self.sign == Sign::Remove
    }
}

impl FromStr for FlagSpec {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        let (sign, flag) = Sign::split_token(token);
        Ok(Self::new(sign, flag.parse()?))
    }
}

impl fmt::Display for FlagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sign, self.flag)
    }
}
