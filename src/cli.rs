//! # CLI module
//!
//! Module dedicated to the command-line surface, based on [clap]
//! derive. Flag tokens are validated here, at argument-parsing time,
//! before any connection is made.

use std::path::PathBuf;

use clap::Parser;

use crate::{
    filter::{FilterConfig, DEFAULT_CHUNK_SIZE},
    flag::FlagSpec,
    folder::{FolderSelection, ALL_FOLDERS},
    label::LabelSpec,
};

/// Bulk-apply actions to messages of an IMAP account.
#[derive(Debug, Parser)]
#[command(name = "bulkmail", version, about)]
pub struct Cli {
    /// Name of the configured account to use.
    #[arg(short = 'a', long, value_name = "NAME")]
    pub account: String,

    /// Path to the configuration file.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of messages mutated per protocol call.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Dump the IMAP conversation to stderr.
    #[arg(long)]
    pub debug_imap: bool,

    /// Search query selecting the messages to process, in the
    /// provider query syntax. Omitted means all messages.
    #[arg(short = 'Q', long, value_name = "QUERY")]
    pub query: Option<String>,

    /// Exit with an error when the filter matches no messages.
    /// Requires exactly one target folder.
    #[arg(long)]
    pub fail_if_empty: bool,

    /// Flag to add to (+) or remove from (-) matching messages.
    #[arg(
        short = 'F',
        long = "flag",
        value_name = "[+-]FLAG",
        allow_hyphen_values = true
    )]
    pub flags: Vec<FlagSpec>,

    /// Label to add to (+) or remove from (-) matching messages.
    #[arg(
        short = 'L',
        long = "label",
        value_name = "[+-]LABEL",
        allow_hyphen_values = true
    )]
    pub labels: Vec<LabelSpec>,

    /// Delete matching messages.
    #[arg(short = 'D', long)]
    pub delete: bool,

    /// Move matching messages to the trash.
    #[arg(short = 'T', long)]
    pub trash: bool,

    /// Show matching messages.
    #[arg(short = 'S', long)]
    pub show: bool,

    /// Remove matching messages from the inbox.
    #[arg(short = 'A', long)]
    pub archive: bool,

    /// Folders to process.
    #[arg(value_name = "FOLDER", default_value = ALL_FOLDERS)]
    pub folders: Vec<String>,
}

impl Cli {
    /// Builds the run configuration out of the parsed arguments.
    pub fn to_filter_config(&self) -> FilterConfig {
        FilterConfig {
            query: self.query.clone(),
            fail_if_empty: self.fail_if_empty,
            flags: self.flags.clone(),
            labels: self.labels.clone(),
            delete: self.delete,
            trash: self.trash,
            show: self.show,
            archive: self.archive,
            folders: FolderSelection::from_tokens(&self.folders),
            chunk_size: self.chunk_size,
        }
    }
}
