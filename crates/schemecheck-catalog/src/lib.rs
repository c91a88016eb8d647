//! Catalog providers for schema introspection
//!
//! This crate reads table and column metadata from a live database catalog.
//! Each provider issues two kinds of queries: one listing user tables, and
//! one per table listing its columns.
//!
//! ## Features
//!
//! Enable database support via Cargo features:
//! - `postgres` - PostgreSQL support
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemecheck_catalog::{PostgresProvider, SchemaProvider, TableFilter};
//!
//! let provider = PostgresProvider::new("host=localhost user=audit")?;
//! let tables = provider.list_tables("shop", &TableFilter::default()).await?;
//! let columns = provider.load_columns(&tables[0], "shop").await?;
//! ```

pub mod provider;
pub mod postgres;
pub mod mock;

pub use provider::{SchemaProvider, TableFilter, FetchError};
pub use postgres::{database_from_connection, PostgresProvider};
pub use mock::MockProvider;
