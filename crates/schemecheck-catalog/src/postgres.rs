//! PostgreSQL schema provider using pg_catalog
//!
//! Tables come from `pg_class` (ordinary and partitioned relations outside the
//! system namespaces). Primary keys come from `pg_index.indisprimary` and
//! column comments from `col_description`.
//!
//! Every call opens a fresh connection to the requested database and drops it
//! before returning, so a provider value is cheap to keep around.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let provider = PostgresProvider::new("host=localhost user=audit password=secret")?;
//! let tables = provider.list_tables("shop", &TableFilter::default()).await?;
//! let columns = provider.load_columns(&tables[0], "shop").await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/catalogs.html

use crate::provider::{FetchError, SchemaProvider, TableFilter};
use schemecheck_core::{Column, Table};

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, Config as PgConfig, NoTls, Row};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

/// User tables with row estimate and primary key existence
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
const LIST_TABLES_SQL: &str = r#"
    SELECT
        c.relname::text AS table_name,
        n.nspname::text AS schema_name,
        GREATEST(c.reltuples, 0)::int8 AS row_count,
        EXISTS (
            SELECT 1 FROM pg_catalog.pg_index i
            WHERE i.indrelid = c.oid AND i.indisprimary
        ) AS has_primary_key
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r', 'p')
      AND n.nspname NOT IN ('pg_catalog', 'information_schema')
      AND n.nspname NOT LIKE 'pg_toast%'
      AND (cardinality($1::text[]) = 0 OR lower(c.relname) = ANY($1::text[]))
    ORDER BY c.relname
"#;

/// Columns of one table in ordinal order
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
const LIST_COLUMNS_SQL: &str = r#"
    SELECT
        a.attnum::int4 AS ordinal,
        a.attname::text AS column_name,
        t.typname::text AS db_type,
        EXISTS (
            SELECT 1 FROM pg_catalog.pg_index i
            WHERE i.indrelid = c.oid AND i.indisprimary AND a.attnum = ANY(i.indkey)
        ) AS is_primary_key,
        (a.attidentity <> '' OR pg_catalog.pg_get_serial_sequence(
            quote_ident(n.nspname) || '.' || quote_ident(c.relname), a.attname) IS NOT NULL
        ) AS is_identity,
        NOT a.attnotnull AS is_nullable,
        (CASE
            WHEN t.typlen > 0 THEN t.typlen::int4
            WHEN t.typname IN ('varchar', 'bpchar') AND a.atttypmod > 4 THEN a.atttypmod - 4
            ELSE -1
        END)::int4 AS byte_length,
        (CASE
            WHEN t.typname = 'numeric' AND a.atttypmod >= 4 THEN ((a.atttypmod - 4) >> 16) & 65535
            ELSE 0
        END)::int4 AS numeric_precision,
        (CASE
            WHEN t.typname = 'numeric' AND a.atttypmod >= 4 THEN (a.atttypmod - 4) & 65535
            ELSE 0
        END)::int4 AS numeric_scale,
        COALESCE(pg_catalog.col_description(c.oid, a.attnum), '') AS remark
    FROM pg_catalog.pg_attribute a
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
    WHERE n.nspname = $1
      AND c.relname = $2
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attnum
"#;

/// PostgreSQL schema provider
///
/// Holds a connection descriptor; the database name of each call replaces
/// whatever database the descriptor names.
pub struct PostgresProvider {
    /// Parsed connection settings (only available with postgres feature)
    #[cfg(feature = "postgres")]
    config: PgConfig,

    /// Connect over TLS
    tls: bool,

    /// Placeholder for when feature is disabled
    #[cfg(not(feature = "postgres"))]
    _phantom: std::marker::PhantomData<()>,
}

impl PostgresProvider {
    /// Create a provider from a connection string
    ///
    /// Supports both `host=... user=...` and `postgres://` URL formats. No
    /// connection is made until the first call.
    #[cfg(feature = "postgres")]
    pub fn new(conn_str: &str) -> Result<Self, FetchError> {
        Ok(Self { config: parse_config(conn_str)?, tls: false })
    }

    /// Create provider without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub fn new(_conn_str: &str) -> Result<Self, FetchError> {
        Err(not_compiled())
    }

    /// Connect over TLS via native-tls
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Whether TLS is used
    pub fn uses_tls(&self) -> bool {
        self.tls
    }

    /// Open a connection to one database
    ///
    /// The driver task ends once the returned client is dropped.
    #[cfg(feature = "postgres")]
    async fn connect(&self, database: &str) -> Result<Client, FetchError> {
        let mut config = self.config.clone();
        config.dbname(database);

        let host = config.get_hosts()
            .first()
            .map(|h| format!("{:?}", h))
            .unwrap_or_else(|| "localhost".to_string());

        if self.tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| FetchError::Config(format!(
                    "Failed to create TLS connector: {}", e
                )))?;

            let (client, connection) = config.connect(MakeTlsConnector::new(connector))
                .await
                .map_err(|e| FetchError::Connection(format!(
                    "Failed to connect to {} at {} with TLS: {}", database, host, e
                )))?;

            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(host = %host, "PostgreSQL TLS connection error: {}", e);
                }
            });

            Ok(client)
        } else {
            let (client, connection) = config.connect(NoTls)
                .await
                .map_err(|e| FetchError::Connection(format!(
                    "Failed to connect to {} at {}: {}", database, host, e
                )))?;

            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(host = %host, "PostgreSQL connection error: {}", e);
                }
            });

            Ok(client)
        }
    }

    #[cfg(feature = "postgres")]
    fn table_from_row(row: &Row) -> Result<Table, tokio_postgres::Error> {
        Ok(Table::new(
            row.try_get::<_, String>("table_name")?,
            row.try_get::<_, String>("schema_name")?,
        )
        .with_row_count(row.try_get("row_count")?)
        .with_primary_key(row.try_get("has_primary_key")?))
    }

    #[cfg(feature = "postgres")]
    fn column_from_row(row: &Row) -> Result<Column, tokio_postgres::Error> {
        let db_type: String = row.try_get("db_type")?;
        let byte_length: i32 = row.try_get("byte_length")?;

        Ok(Column {
            ordinal: row.try_get("ordinal")?,
            name: row.try_get("column_name")?,
            is_primary_key: row.try_get("is_primary_key")?,
            is_identity: row.try_get("is_identity")?,
            is_nullable: row.try_get("is_nullable")?,
            byte_length,
            char_length: Column::derive_char_length(&db_type, byte_length),
            precision: row.try_get("numeric_precision")?,
            scale: row.try_get("numeric_scale")?,
            remark: row.try_get("remark")?,
            db_type,
        })
    }
}

/// Database named by a connection descriptor
///
/// Uses the driver's own parser, so quoted values, percent-encoded URL paths
/// and `?dbname=` parameters resolve to the database a connection would open.
#[cfg(feature = "postgres")]
pub fn database_from_connection(conn_str: &str) -> Result<Option<String>, FetchError> {
    let config = parse_config(conn_str)?;

    Ok(config
        .get_dbname()
        .filter(|name| !name.is_empty())
        .map(str::to_string))
}

#[cfg(not(feature = "postgres"))]
pub fn database_from_connection(_conn_str: &str) -> Result<Option<String>, FetchError> {
    Err(not_compiled())
}

#[cfg(feature = "postgres")]
fn parse_config(conn_str: &str) -> Result<PgConfig, FetchError> {
    conn_str
        .parse()
        .map_err(|e| FetchError::Config(format!("Invalid connection string: {}", e)))
}

#[cfg(not(feature = "postgres"))]
fn not_compiled() -> FetchError {
    FetchError::Config(
        "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string(),
    )
}

#[async_trait::async_trait]
impl SchemaProvider for PostgresProvider {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn list_tables(
        &self,
        database: &str,
        filter: &TableFilter,
    ) -> Result<Vec<Table>, FetchError> {
        let client = self.connect(database).await?;
        let names = filter.folded_names();

        let rows = client
            .query(LIST_TABLES_SQL, &[&names])
            .await
            .map_err(|e| FetchError::query(format!("Listing tables of {}: {}", database, e)))?;

        let tables = rows
            .iter()
            .map(Self::table_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FetchError::query(format!("Unexpected table row: {}", e)))?;

        tracing::debug!(database, count = tables.len(), "listed tables");
        Ok(tables)
    }

    #[cfg(not(feature = "postgres"))]
    async fn list_tables(
        &self,
        _database: &str,
        _filter: &TableFilter,
    ) -> Result<Vec<Table>, FetchError> {
        Err(not_compiled())
    }

    #[cfg(feature = "postgres")]
    async fn load_columns(&self, table: &Table, database: &str) -> Result<Vec<Column>, FetchError> {
        let client = self.connect(database).await?;

        let rows = client
            .query(LIST_COLUMNS_SQL, &[&table.schema_name, &table.name])
            .await
            .map_err(|e| FetchError::for_table(table.qualified_name(), e.to_string()))?;

        let columns = rows
            .iter()
            .map(Self::column_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FetchError::for_table(
                table.qualified_name(),
                format!("Unexpected column row: {}", e),
            ))?;

        tracing::debug!(table = %table.qualified_name(), count = columns.len(), "loaded columns");
        Ok(columns)
    }

    #[cfg(not(feature = "postgres"))]
    async fn load_columns(&self, _table: &Table, _database: &str) -> Result<Vec<Column>, FetchError> {
        Err(not_compiled())
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self, database: &str) -> Result<(), FetchError> {
        let client = self.connect(database).await?;

        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| FetchError::query(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self, _database: &str) -> Result<(), FetchError> {
        Err(not_compiled())
    }
}
