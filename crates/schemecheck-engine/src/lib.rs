//! Schemecheck engine
//!
//! This crate holds the comparison logic and the export/compare flows:
//! - Case-insensitive schema differ
//! - Snapshot export from a live catalog
//! - Comparison of live or snapshot sources

pub mod comparison;
pub mod orchestrator;

pub use comparison::SchemaComparison;
pub use orchestrator::{
    compare_sources, export_snapshot, fetch_schema, load_schema, test_connection, CheckError,
    CompareOutcome, FetchOptions, ProviderFactory, SchemaSource,
};
