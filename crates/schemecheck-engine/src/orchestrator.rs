//! Export and compare flows
//!
//! Obtains schemas from live databases or snapshot files and runs the
//! comparison. All calls return typed errors; nothing here exits the process.

use crate::comparison::SchemaComparison;
use schemecheck_catalog::{database_from_connection, FetchError, SchemaProvider, TableFilter};
use schemecheck_core::{snapshot, ConnectionConfig, FetchPolicy, Schema, SnapshotError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors from an export or compare run
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("No database name given and none found in connection '{0}'")]
    MissingDatabase(String),
}

/// Where one side of a comparison comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Query a live database
    Live {
        connection: String,
        database: String,
        tls: bool,
    },

    /// Read a snapshot file
    Snapshot(PathBuf),
}

impl SchemaSource {
    /// Live source from a connection config, resolving the database name
    ///
    /// An explicit name wins; otherwise the driver reads it from the
    /// connection descriptor.
    pub fn live(config: &ConnectionConfig) -> Result<Self, CheckError> {
        let database = match config.explicit_database() {
            Some(database) => database.to_string(),
            None => database_from_connection(&config.connection)?
                .ok_or_else(|| CheckError::MissingDatabase(redact_connection(&config.connection)))?,
        };

        Ok(Self::Live {
            connection: config.connection.clone(),
            database,
            tls: config.tls,
        })
    }

    /// Snapshot source
    pub fn snapshot(path: impl Into<PathBuf>) -> Self {
        Self::Snapshot(path.into())
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot(_))
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live { database, .. } => write!(f, "database '{}'", database),
            Self::Snapshot(path) => write!(f, "snapshot '{}'", path.display()),
        }
    }
}

/// Builds a provider for a live source
///
/// Lets tests substitute an in-memory provider for the real driver.
pub trait ProviderFactory {
    fn provider(&self, connection: &str, tls: bool) -> Result<Box<dyn SchemaProvider>, FetchError>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&str, bool) -> Result<Box<dyn SchemaProvider>, FetchError>,
{
    fn provider(&self, connection: &str, tls: bool) -> Result<Box<dyn SchemaProvider>, FetchError> {
        self(connection, tls)
    }
}

/// Options shared by export and compare
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub filter: TableFilter,
    pub policy: FetchPolicy,
}

/// List tables, then load each table's columns
///
/// Under [`FetchPolicy::SkipTable`] a table whose columns fail to load is
/// left out; tables loaded before it are kept either way.
pub async fn fetch_schema(
    provider: &dyn SchemaProvider,
    database: &str,
    options: &FetchOptions,
) -> Result<Schema, CheckError> {
    let tables = provider.list_tables(database, &options.filter).await?;
    tracing::info!(
        provider = provider.name(),
        database,
        filter = %options.filter,
        tables = tables.len(),
        "listed tables"
    );

    let mut loaded = Vec::with_capacity(tables.len());
    for table in tables {
        match provider.load_columns(&table, database).await {
            Ok(columns) => {
                tracing::debug!(table = %table.qualified_name(), columns = columns.len(), "loaded table");
                loaded.push(table.with_columns(columns));
            }
            Err(e) if options.policy == FetchPolicy::SkipTable => {
                tracing::warn!(table = %table.qualified_name(), error = %e, "skipping table");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Schema::from_tables(loaded))
}

/// Obtain the schema of one source
pub async fn load_schema(
    factory: &dyn ProviderFactory,
    source: &SchemaSource,
    options: &FetchOptions,
) -> Result<Schema, CheckError> {
    match source {
        SchemaSource::Snapshot(path) => {
            let schema = snapshot::load_from_file(path)?;
            tracing::info!(path = %path.display(), tables = schema.len(), "loaded snapshot");
            Ok(retain_filtered(schema, &options.filter))
        }
        SchemaSource::Live { connection, database, tls } => {
            let provider = factory.provider(connection, *tls)?;
            fetch_schema(provider.as_ref(), database, options).await
        }
    }
}

/// Capture a live schema into a snapshot file
///
/// An existing file is only replaced when `overwrite` is set; the check
/// happens before the database is queried.
pub async fn export_snapshot(
    factory: &dyn ProviderFactory,
    source: &SchemaSource,
    options: &FetchOptions,
    path: &Path,
    overwrite: bool,
) -> Result<Schema, CheckError> {
    if path.exists() && !overwrite {
        return Err(SnapshotError::AlreadyExists(path.display().to_string()).into());
    }

    let schema = load_schema(factory, source, options).await?;
    snapshot::save_to_file(&schema, path, overwrite)?;
    tracing::info!(path = %path.display(), tables = schema.len(), "snapshot written");

    Ok(schema)
}

/// Schemas of both sides plus their comparison
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub expected: Schema,
    pub actual: Schema,
    pub comparison: SchemaComparison,
}

/// Load both sides and compare them
///
/// Snapshot sides are read before any live side is queried, so a malformed
/// snapshot fails the run without touching a database.
pub async fn compare_sources(
    factory: &dyn ProviderFactory,
    expected: &SchemaSource,
    actual: &SchemaSource,
    options: &FetchOptions,
) -> Result<CompareOutcome, CheckError> {
    let (expected_schema, actual_schema) = if actual.is_snapshot() && !expected.is_snapshot() {
        let actual_schema = load_schema(factory, actual, options).await?;
        let expected_schema = load_schema(factory, expected, options).await?;
        (expected_schema, actual_schema)
    } else {
        let expected_schema = load_schema(factory, expected, options).await?;
        let actual_schema = load_schema(factory, actual, options).await?;
        (expected_schema, actual_schema)
    };

    let comparison = SchemaComparison::compare(&expected_schema, &actual_schema);
    tracing::info!(%expected, %actual, discrepancies = comparison.len(), "compare finished");

    Ok(CompareOutcome {
        expected: expected_schema,
        actual: actual_schema,
        comparison,
    })
}

/// Check that a source is reachable: a live database accepts a connection, a snapshot parses
pub async fn test_connection(factory: &dyn ProviderFactory, source: &SchemaSource) -> Result<(), CheckError> {
    match source {
        SchemaSource::Live { connection, database, tls } => {
            let provider = factory.provider(connection, *tls)?;
            provider.test_connection(database).await?;
            Ok(())
        }
        SchemaSource::Snapshot(path) => {
            snapshot::load_from_file(path)?;
            Ok(())
        }
    }
}

/// Apply the allow-list to a snapshot, which may hold more tables than asked for
fn retain_filtered(schema: Schema, filter: &TableFilter) -> Schema {
    if filter.is_empty() {
        return schema;
    }

    schema
        .tables
        .into_iter()
        .filter(|t| filter.allows(&t.name))
        .collect()
}

/// Connection descriptor with its password removed, for messages
pub fn redact_connection(connection: &str) -> String {
    if let Some((scheme, rest)) = connection.split_once("://") {
        if let Some((userinfo, host)) = rest.rsplit_once('@') {
            let user = userinfo.split(':').next().unwrap_or_default();
            return format!("{}://{}@{}", scheme, user, host);
        }
        return connection.to_string();
    }

    connection
        .split_whitespace()
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key.eq_ignore_ascii_case("password") => format!("{}=***", key),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
