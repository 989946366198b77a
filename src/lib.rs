//! # bulkmail
//!
//! Library behind the `bulkmail` CLI: bulk-apply actions (flagging,
//! labeling, archiving, trashing, deleting, displaying) to email
//! messages selected by a mailbox folder and an optional search
//! query, against a remote IMAP server.
//!
//! The main entry point is [`filter::BulkFilter`], which drives a
//! [`backend::MailSession`] (one blocking IMAP connection, reused for
//! the whole run) according to a [`filter::FilterConfig`] built once
//! from CLI input.

pub mod account;
pub mod backend;
pub mod cli;
pub mod envelope;
pub mod filter;
pub mod flag;
pub mod folder;
pub mod label;

#[doc(inline)]
pub use crate::{
    backend::MailSession,
    envelope::{Address, Envelope, Envelopes},
    filter::{BulkFilter, FilterConfig},
    flag::{Flag, FlagSpec},
    label::{LabelSpec, Sign},
};
