//! SchemeCheck Core
//!
//! Schema model, snapshot format and discrepancy types.
//! Never rename discrepancy codes - they are part of the report format.

pub mod discrepancy;
pub mod schema;
pub mod snapshot;
pub mod report;
pub mod config;

pub use discrepancy::{Discrepancy, DiscrepancyKind, render_lines, NO_DISCREPANCIES};
pub use schema::{Column, Schema, Table, names_match, duplicate_names};
pub use snapshot::SnapshotError;
pub use report::{CompareReport, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, ConnectionConfig, FetchPolicy};
