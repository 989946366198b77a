//! # Folder module
//!
//! Module dedicated to folder (as known as mailbox) selection. The
//! main entity is the [`FolderSelection`]: the ordered list of folder
//! names given on the command line, or the `@all` sentinel standing
//! for every folder known to the account. A selection is resolved
//! once per run against the concrete folder list reported by the
//! server.

use std::{collections::HashSet, result};

use thiserror::Error;

/// The Inbox folder name.
pub const INBOX: &str = "INBOX";

/// The sentinel folder token standing for all folders known to the
/// account.
pub const ALL_FOLDERS: &str = "@all";

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resolve folders: no matching folders")]
    NoMatchingFoldersError,
}

/// The folder selection.
///
/// Either an ordered sequence of folder names or the sentinel meaning
/// all folders known to the account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FolderSelection {
    /// All folders known to the account.
    All,

    /// The given folders, processed in order.
    Names(Vec<String>),
}

impl Default for FolderSelection {
    fn default() -> Self {
        Self::All
    }
}

impl FolderSelection {
    /// Builds a selection from raw command-line tokens. An empty
    /// token list or any `@all` token selects all folders.
    pub fn from_tokens(tokens: impl IntoIterator<Item = impl ToString>) -> Self {
        let names: Vec<String> = tokens.into_iter().map(|t| t.to_string()).collect();

        if names.is_empty() || names.iter().any(|name| name == ALL_FOLDERS) {
            Self::All
        } else {
            Self::Names(names)
        }
    }

    /// Resolves the selection against the concrete folder names known
    /// to the account, as reported by the folder-listing capability.
    ///
    /// The result is deduplicated and keeps the selection order
    /// (server order for [`FolderSelection::All`]). Explicit names
    /// are kept only when the server actually knows them, INBOX being
    /// matched case-insensitively as required by IMAP.
    pub fn resolve(&self, known: &[String]) -> Result<Vec<String>> {
        let mut seen: HashSet<&str> = HashSet::new();

        let folders: Vec<String> = match self {
            Self::All => known
                .iter()
                .filter(|name| seen.insert(name.as_str()))
                .cloned()
                .collect(),
            Self::Names(names) => names
                .iter()
                .filter_map(|name| {
                    known.iter().find(|known_name| {
                        *known_name == name
                            || (name.eq_ignore_ascii_case(INBOX)
                                && known_name.eq_ignore_ascii_case(INBOX))
                    })
                })
                .filter(|name| seen.insert(name.as_str()))
                .cloned()
                .collect(),
        };

        if folders.is_empty() {
            return Err(Error::NoMatchingFoldersError);
        }

        Ok(folders)
    }
}
