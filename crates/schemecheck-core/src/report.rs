//! Compare report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::discrepancy::{Discrepancy, DiscrepancyKind};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of discrepancies
    pub total: usize,

    /// Tables on the expected side
    pub expected_tables: usize,

    /// Tables on the actual side
    pub actual_tables: usize,

    pub tables_missing_in_target: usize,
    pub tables_removed_from_source: usize,
    pub columns_missing_in_target: usize,
    pub columns_removed_from_source: usize,
    pub primary_key_changes: usize,
    pub nullability_changes: usize,
    pub type_changes: usize,
}

impl ReportSummary {
    /// Number of discrepancies of one kind
    pub fn count(&self, kind: DiscrepancyKind) -> usize {
        match kind {
            DiscrepancyKind::TableMissingInTarget => self.tables_missing_in_target,
            DiscrepancyKind::TableRemovedFromSource => self.tables_removed_from_source,
            DiscrepancyKind::ColumnMissingInTarget => self.columns_missing_in_target,
            DiscrepancyKind::ColumnRemovedFromSource => self.columns_removed_from_source,
            DiscrepancyKind::PrimaryKeyChanged => self.primary_key_changes,
            DiscrepancyKind::NullabilityChanged => self.nullability_changes,
            DiscrepancyKind::TypeChanged => self.type_changes,
        }
    }

    fn record(&mut self, kind: DiscrepancyKind) {
        let slot = match kind {
            DiscrepancyKind::TableMissingInTarget => &mut self.tables_missing_in_target,
            DiscrepancyKind::TableRemovedFromSource => &mut self.tables_removed_from_source,
            DiscrepancyKind::ColumnMissingInTarget => &mut self.columns_missing_in_target,
            DiscrepancyKind::ColumnRemovedFromSource => &mut self.columns_removed_from_source,
            DiscrepancyKind::PrimaryKeyChanged => &mut self.primary_key_changes,
            DiscrepancyKind::NullabilityChanged => &mut self.nullability_changes,
            DiscrepancyKind::TypeChanged => &mut self.type_changes,
        };
        *slot += 1;
        self.total += 1;
    }
}

/// Compare report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Where the expected schema came from
    pub expected_source: String,

    /// Where the actual schema came from
    pub actual_source: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All discrepancies, in emission order
    pub discrepancies: Vec<Discrepancy>,
}

impl CompareReport {
    /// Create a report from a comparison result
    pub fn from_discrepancies(
        expected_source: impl Into<String>,
        actual_source: impl Into<String>,
        expected_tables: usize,
        actual_tables: usize,
        discrepancies: Vec<Discrepancy>,
    ) -> Self {
        let mut summary = ReportSummary {
            expected_tables,
            actual_tables,
            ..ReportSummary::default()
        };
        for d in &discrepancies {
            summary.record(d.kind);
        }

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            expected_source: expected_source.into(),
            actual_source: actual_source.into(),
            summary,
            discrepancies,
        }
    }

    /// Schemas matched on every checked attribute
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
