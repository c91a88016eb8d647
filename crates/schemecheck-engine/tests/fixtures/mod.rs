//! Shared fixtures for engine tests

#![allow(dead_code)]

use schemecheck_catalog::{FetchError, MockProvider, SchemaProvider};
use schemecheck_core::{Column, Table};

pub const PRODUCTION: &str = "host=prod dbname=shop";
pub const STAGING: &str = "host=staging dbname=shop";

/// Orders table as deployed in production
pub fn orders_table() -> Table {
    Table::new("Orders", "dbo")
        .with_primary_key(true)
        .with_columns(vec![
            Column::new(1, "id", "int")
                .primary_key()
                .with_nullable(false)
                .with_byte_length(4),
            Column::new(2, "total", "decimal")
                .with_byte_length(9)
                .with_precision(18, 2),
        ])
}

/// Customers table as deployed in production
pub fn customers_table() -> Table {
    Table::new("Customers", "dbo")
        .with_primary_key(true)
        .with_columns(vec![
            Column::new(1, "id", "int")
                .primary_key()
                .with_nullable(false)
                .with_byte_length(4),
            Column::new(2, "name", "nvarchar").with_byte_length(200),
        ])
}

/// Two mock servers sharing nothing, keyed by the connection they answer
pub struct Servers {
    pub production: MockProvider,
    pub staging: MockProvider,
}

impl Servers {
    pub fn new() -> Self {
        Self {
            production: MockProvider::new(),
            staging: MockProvider::new(),
        }
    }

    /// Provider for a connection string, sharing the mock's state
    pub fn provider(&self, connection: &str, _tls: bool) -> Result<Box<dyn SchemaProvider>, FetchError> {
        match connection {
            PRODUCTION => Ok(Box::new(self.production.clone())),
            STAGING => Ok(Box::new(self.staging.clone())),
            other => Err(FetchError::Connection(format!("unknown server {}", other))),
        }
    }
}
