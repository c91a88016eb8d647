//! Schema provider trait for reading table and column metadata

use schemecheck_core::{names_match, Column, Table};
use std::fmt;

/// Comma-separated allow-list of table names
///
/// Matching is case-insensitive. An empty filter admits every table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    names: Vec<String>,
}

impl TableFilter {
    /// Parse a comma-separated list, ignoring blanks around and between names
    pub fn parse(list: &str) -> Self {
        Self::from_names(list.split(','))
    }

    /// Build from individual names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// No restriction
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether a table name is admitted
    pub fn allows(&self, table: &str) -> bool {
        self.is_empty() || self.names.iter().any(|n| names_match(n, table))
    }

    /// Lower-cased names, for catalog queries
    pub fn folded_names(&self) -> Vec<String> {
        self.names.iter().map(|n| n.to_lowercase()).collect()
    }
}

impl fmt::Display for TableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(","))
    }
}

/// Errors that can occur when reading a catalog
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Catalog query failed: {0}")]
    SchemaFetch(String),

    #[error("Catalog query failed for table {table}: {message}")]
    TableFetch { table: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Query failure not tied to one table
    pub fn query(message: impl Into<String>) -> Self {
        Self::SchemaFetch(message.into())
    }

    /// Query failure while reading one table
    pub fn for_table(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TableFetch {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Trait for catalogs that can list tables and their columns
///
/// Implementations open their own connection per call and release it before
/// returning.
#[async_trait::async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Get the provider name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// List user tables of a database, ordered by name
    ///
    /// Returned tables carry no columns yet.
    async fn list_tables(
        &self,
        database: &str,
        filter: &TableFilter,
    ) -> Result<Vec<Table>, FetchError>;

    /// Load the columns of one table, ordered by ordinal
    async fn load_columns(&self, table: &Table, database: &str) -> Result<Vec<Column>, FetchError>;

    /// Connect to one database and run a trivial query
    async fn test_connection(&self, database: &str) -> Result<(), FetchError>;
}
