//! # Account module
//!
//! Module dedicated to account configuration. Accounts are declared
//! in a TOML file mapping a name to the host and credentials of an
//! IMAP server, and looked up by name with [`Config::account`].

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    result,
};

use serde::Deserialize;
use thiserror::Error;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find account {0}")]
    NoSuchAccountError(String),
    #[error("cannot find default config file path")]
    GetDefaultConfigPathError,
    #[error("cannot read config file at {1}")]
    ReadConfigFileError(#[source] std::io::Error, PathBuf),
    #[error("cannot parse config file at {1}")]
    ParseConfigFileError(#[source] toml::de::Error, PathBuf),
}

/// The whole configuration file: account configurations indexed by
/// their name.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,
}

impl Config {
    /// Reads and parses the configuration from the given TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|err| Error::ReadConfigFileError(err, path.to_owned()))?;

        toml::from_str(&content)
            .map_err(|err| Error::ParseConfigFileError(err, path.to_owned()))
    }

    /// Returns the default configuration file path:
    /// `$XDG_CONFIG_HOME/bulkmail/config.toml` or the platform
    /// equivalent.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("bulkmail").join("config.toml"))
            .ok_or(Error::GetDefaultConfigPathError)
    }

    /// Finds the account configuration matching the given name.
    pub fn account(&self, name: &str) -> Result<&AccountConfig> {
        self.accounts
            .get(name)
            .ok_or_else(|| Error::NoSuchAccountError(name.to_owned()))
    }
}

/// The configuration of one IMAP account.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct AccountConfig {
    /// The IMAP server hostname.
    pub host: String,

    /// The IMAP server port. Defaults to 993 with SSL, 143 without.
    pub port: Option<u16>,

    pub username: String,
    pub password: String,

    /// Whether to connect over TLS. Enabled unless explicitly turned
    /// off.
    #[serde(default = "default_ssl")]
    pub ssl: bool,
}

impl AccountConfig {
    pub fn imap_port(&self) -> u16 {
        self.port.unwrap_or(if self.ssl { 993 } else { 143 })
    }
}

fn default_ssl() -> bool {
    true
}
