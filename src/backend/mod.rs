//! # Backend module
//!
//! Module dedicated to the mail server session. The main entity is
//! the [`MailSession`] trait: the narrow boundary the bulk filter
//! drives, covering folder listing and selection, searching, flag and
//! label mutation, deletion, expunge and envelope fetching.
//!
//! The only production implementation lives in [`imap`]: one blocking
//! IMAP connection, opened at startup and reused for the whole run.

pub mod imap;

use std::result;

use thiserror::Error;

use crate::{envelope::Envelopes, flag::Flag};

/// The message identifier within its selected folder.
pub type Uid = u32;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build TLS connector")]
    CreateTlsConnectorError(#[from] native_tls::Error),
    #[error("cannot connect to {1}:{2}")]
    ConnectImapError(#[source] ::imap::Error, String, u16),
    #[error("cannot connect to {1}:{2}")]
    ConnectTcpError(#[source] std::io::Error, String, u16),
    #[error("cannot login to {1}")]
    LoginImapError(#[source] ::imap::Error, String),
    #[error("cannot get server capabilities")]
    GetCapabilitiesImapError(#[source] ::imap::Error),
    #[error("cannot list folders")]
    ListFoldersImapError(#[source] ::imap::Error),
    #[error("cannot select folder {1}")]
    SelectFolderImapError(#[source] ::imap::Error, String),
    #[error("cannot search messages")]
    SearchUidsImapError(#[source] ::imap::Error),
    #[error("cannot store {1} on messages")]
    StoreImapError(#[source] ::imap::Error, String),
    #[error("cannot fetch envelopes")]
    FetchEnvelopesImapError(#[source] ::imap::Error),
    #[error("cannot fetch labels")]
    FetchLabelsImapError(#[source] ::imap::Error),
    #[error("cannot expunge selected folder")]
    ExpungeImapError(#[source] ::imap::Error),
    #[error("cannot logout")]
    LogoutImapError(#[source] ::imap::Error),
}

/// The mail server session the bulk filter runs against.
///
/// Mutation calls take the UID chunk they apply to; expunge commits
/// all pending deletions of the selected folder, it is not scoped to
/// a chunk. Implementations do not retry: any error propagates to the
/// caller as is.
pub trait MailSession {
    /// Lists the names of all selectable folders of the account.
    fn list_folders(&mut self) -> Result<Vec<String>>;

    /// Selects the given folder for the following calls.
    fn select_folder(&mut self, folder: &str) -> Result<()>;

    /// Searches all messages of the selected folder. UIDs are
    /// returned in ascending order.
    fn search_all(&mut self) -> Result<Vec<Uid>>;

    /// Searches messages of the selected folder matching the given
    /// provider query. UIDs are returned in ascending order.
    fn search_query(&mut self, query: &str) -> Result<Vec<Uid>>;

    /// Adds the given flags to the given messages. An empty flag list
    /// is a valid no-op.
    fn add_flags(&mut self, uids: &[Uid], flags: &[Flag]) -> Result<()>;

    /// Removes the given flags from the given messages. An empty flag
    /// list is a valid no-op.
    fn remove_flags(&mut self, uids: &[Uid], flags: &[Flag]) -> Result<()>;

    /// Adds the given labels to the given messages. An empty label
    /// list is a valid no-op.
    fn add_labels(&mut self, uids: &[Uid], labels: &[String]) -> Result<()>;

    /// Removes the given labels from the given messages. An empty
    /// label list is a valid no-op.
    fn remove_labels(&mut self, uids: &[Uid], labels: &[String]) -> Result<()>;

    /// Marks the given messages for deletion.
    fn delete_messages(&mut self, uids: &[Uid]) -> Result<()>;

    /// Permanently commits all deletions marked on the selected
    /// folder so far.
    fn expunge(&mut self) -> Result<()>;

    /// Fetches envelope and label metadata for the given messages.
    fn fetch_envelopes(&mut self, uids: &[Uid]) -> Result<Envelopes>;

    /// Closes the session.
    fn logout(&mut self) -> Result<()>;
}
