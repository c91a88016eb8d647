//! Mock schema provider for testing
//!
//! This provider returns predefined tables without connecting to any database.
//! It's useful for:
//! - Unit testing the comparison and orchestration logic
//! - Demos without real credentials
//! - Simulating connection and catalog failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemecheck_catalog::{MockProvider, SchemaProvider, TableFilter};
//! use schemecheck_core::{Column, Table};
//!
//! let provider = MockProvider::new();
//! provider.add_table("shop", Table::new("Orders", "public").with_columns(vec![
//!     Column::new(1, "id", "int4").primary_key(),
//! ])).await;
//!
//! let tables = provider.list_tables("shop", &TableFilter::default()).await?;
//! ```

use crate::provider::{FetchError, SchemaProvider, TableFilter};
use schemecheck_core::{names_match, Column, Table};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock schema provider for testing
///
/// Tables are stored per database with their columns. `list_tables` hands
/// them out without columns, `load_columns` returns the stored columns, so the
/// two-step fetch behaves as it does against a real catalog.
pub struct MockProvider {
    /// Predefined tables by database name
    tables: Arc<RwLock<HashMap<String, Vec<Table>>>>,

    /// Errors to return for specific tables (keyed by `database.table`, lower case)
    errors: Arc<RwLock<HashMap<String, FetchError>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Number of table listings served
    list_calls: Arc<AtomicUsize>,

    /// Number of column loads served
    column_calls: Arc<AtomicUsize>,

    /// Databases passed to `test_connection`, in call order
    checked: Arc<RwLock<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with no predefined tables
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            fail_connection: false,
            list_calls: Arc::new(AtomicUsize::new(0)),
            column_calls: Arc::new(AtomicUsize::new(0)),
            checked: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a table (with its columns) to a database
    pub async fn add_table(&self, database: &str, table: Table) {
        self.tables
            .write()
            .await
            .entry(database.to_string())
            .or_default()
            .push(table);
    }

    /// Add several tables to a database
    pub async fn add_tables(&self, database: &str, tables: impl IntoIterator<Item = Table>) {
        for table in tables {
            self.add_table(database, table).await;
        }
    }

    /// Configure an error to be returned when loading a table's columns
    pub async fn add_error_for_table(&self, database: &str, table: &str, error: FetchError) {
        self.errors.write().await.insert(error_key(database, table), error);
    }

    /// Configure to fail every call with a connection error
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Number of `list_tables` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `load_columns` calls served so far
    pub fn column_calls(&self) -> usize {
        self.column_calls.load(Ordering::SeqCst)
    }

    /// Databases checked by `test_connection` so far
    pub async fn checked_databases(&self) -> Vec<String> {
        self.checked.read().await.clone()
    }

    /// Number of tables stored for a database
    pub async fn table_count(&self, database: &str) -> usize {
        self.tables.read().await.get(database).map_or(0, Vec::len)
    }

    fn check_connection(&self) -> Result<(), FetchError> {
        if self.fail_connection {
            Err(FetchError::Connection("Simulated connection failure".to_string()))
        } else {
            Ok(())
        }
    }
}

fn error_key(database: &str, table: &str) -> String {
    format!("{}.{}", database, table).to_lowercase()
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            errors: Arc::clone(&self.errors),
            fail_connection: self.fail_connection,
            list_calls: Arc::clone(&self.list_calls),
            column_calls: Arc::clone(&self.column_calls),
            checked: Arc::clone(&self.checked),
        }
    }
}

#[async_trait::async_trait]
impl SchemaProvider for MockProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn list_tables(
        &self,
        database: &str,
        filter: &TableFilter,
    ) -> Result<Vec<Table>, FetchError> {
        self.check_connection()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read().await;
        let mut listed: Vec<Table> = tables
            .get(database)
            .map(|tables| {
                tables
                    .iter()
                    .filter(|t| filter.allows(&t.name))
                    .map(|t| t.clone().with_columns(Vec::new()))
                    .collect()
            })
            .unwrap_or_default();

        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn load_columns(&self, table: &Table, database: &str) -> Result<Vec<Column>, FetchError> {
        self.check_connection()?;
        self.column_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.errors.read().await.get(&error_key(database, &table.name)) {
            return Err(error.clone());
        }

        let tables = self.tables.read().await;
        let stored = tables
            .get(database)
            .and_then(|tables| {
                tables.iter().find(|t| {
                    names_match(&t.name, &table.name) && t.schema_name == table.schema_name
                })
            })
            .ok_or_else(|| FetchError::for_table(table.qualified_name(), "relation does not exist"))?;

        let mut columns = stored.columns.clone();
        columns.sort_by_key(|c| c.ordinal);
        Ok(columns)
    }

    async fn test_connection(&self, database: &str) -> Result<(), FetchError> {
        self.check_connection()?;
        self.checked.write().await.push(database.to_string());
        Ok(())
    }
}
