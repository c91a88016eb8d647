//! Configuration schema (schemecheck.toml)

use serde::{Deserialize, Serialize};

/// Environment variable overriding the source connection
pub const SOURCE_CONNECTION_ENV: &str = "SCHEMECHECK_SOURCE_CONNECTION";

/// Environment variable overriding the target connection
pub const TARGET_CONNECTION_ENV: &str = "SCHEMECHECK_TARGET_CONNECTION";

/// What to do when loading the columns of one table fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Abort the whole fetch
    #[default]
    Abort,

    /// Leave the table out and keep going
    SkipTable,
}

/// One database endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection descriptor (key/value form or URL)
    #[serde(default)]
    pub connection: String,

    /// Database/catalog name; the provider derives it from the connection when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Connect over TLS
    #[serde(default)]
    pub tls: bool,
}

impl ConnectionConfig {
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            database: None,
            tls: false,
        }
    }

    /// Database name given explicitly, ignoring blanks
    pub fn explicit_database(&self) -> Option<&str> {
        self.database
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Point at another server; a database name chosen for the old one is dropped
    pub fn replace_connection(&mut self, connection: String) {
        self.connection = connection;
        self.database = None;
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Restrict the comparison to these tables
    #[serde(default)]
    pub tables: Vec<String>,

    /// Column load failure handling
    #[serde(default)]
    pub fetch_policy: FetchPolicy,

    /// Expected side, when compared live
    #[serde(default)]
    pub source: Option<ConnectionConfig>,

    /// Actual side
    #[serde(default)]
    pub target: Option<ConnectionConfig>,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply connection overrides from the environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply connection overrides from a variable lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(conn) = lookup(SOURCE_CONNECTION_ENV).filter(|c| !c.is_empty()) {
            self.source.get_or_insert_with(ConnectionConfig::default).replace_connection(conn);
        }
        if let Some(conn) = lookup(TARGET_CONNECTION_ENV).filter(|c| !c.is_empty()) {
            self.target.get_or_insert_with(ConnectionConfig::default).replace_connection(conn);
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
