//! Discrepancy kinds and records
//!
//! Kind codes are part of the report format.
//! Do not rename or remove codes - only add new ones.

use serde::{Deserialize, Serialize};

/// Discrepancy kind registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyKind {
    /// Expected table has no counterpart in the target
    TableMissingInTarget,

    /// Target table has no counterpart in the source
    TableRemovedFromSource,

    /// Expected column has no counterpart in the target table
    ColumnMissingInTarget,

    /// Target column has no counterpart in the source table
    ColumnRemovedFromSource,

    /// Primary key membership differs
    PrimaryKeyChanged,

    /// Nullability differs
    NullabilityChanged,

    /// Catalog type name differs
    TypeChanged,
}

impl DiscrepancyKind {
    /// All kinds, in report order
    pub const ALL: [DiscrepancyKind; 7] = [
        Self::TableMissingInTarget,
        Self::TableRemovedFromSource,
        Self::ColumnMissingInTarget,
        Self::ColumnRemovedFromSource,
        Self::PrimaryKeyChanged,
        Self::NullabilityChanged,
        Self::TypeChanged,
    ];

    /// Stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableMissingInTarget => "TABLE_MISSING_IN_TARGET",
            Self::TableRemovedFromSource => "TABLE_REMOVED_FROM_SOURCE",
            Self::ColumnMissingInTarget => "COLUMN_MISSING_IN_TARGET",
            Self::ColumnRemovedFromSource => "COLUMN_REMOVED_FROM_SOURCE",
            Self::PrimaryKeyChanged => "PRIMARY_KEY_CHANGED",
            Self::NullabilityChanged => "NULLABILITY_CHANGED",
            Self::TypeChanged => "TYPE_CHANGED",
        }
    }

    /// Message tail shared by table and column findings
    fn predicate(&self) -> &'static str {
        match self {
            Self::TableMissingInTarget | Self::ColumnMissingInTarget => {
                "does not exist in the target database."
            }
            Self::TableRemovedFromSource | Self::ColumnRemovedFromSource => {
                "has been removed from the source database."
            }
            Self::PrimaryKeyChanged => "has a changed 'primary key' property.",
            Self::NullabilityChanged => "has a changed 'nullable' property.",
            Self::TypeChanged => "has a changed 'data type' property.",
        }
    }
}

impl std::fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One numbered finding of a schema comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// 1-based position in the result
    pub number: usize,

    /// Kind of difference
    pub kind: DiscrepancyKind,

    /// Table the finding refers to
    pub table: String,

    /// Column the finding refers to, for column-level kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Expected value (for changed attributes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual value (for changed attributes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// Human-readable message
    pub message: String,
}

impl Discrepancy {
    /// Table-level finding; the message is derived from the kind
    pub fn table(number: usize, kind: DiscrepancyKind, table: impl Into<String>) -> Self {
        let table = table.into();
        let message = format!("Table \"{}\" {}", table, kind.predicate());

        Self {
            number,
            kind,
            table,
            column: None,
            expected: None,
            actual: None,
            message,
        }
    }

    /// Column-level finding; the message is derived from the kind
    pub fn column(
        number: usize,
        kind: DiscrepancyKind,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        let table = table.into();
        let column = column.into();
        let message = format!(
            "Column \"{}\" of table \"{}\" {}",
            column,
            table,
            kind.predicate()
        );

        Self {
            number,
            kind,
            table,
            column: Some(column),
            expected: None,
            actual: None,
            message,
        }
    }

    /// Numbered line, as shown to the user
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.number, self.message)
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

/// Line shown when a comparison found nothing
pub const NO_DISCREPANCIES: &str = "Check completed: no discrepancies found.";

/// Render a comparison result as numbered lines
pub fn render_lines(discrepancies: &[Discrepancy]) -> Vec<String> {
    if discrepancies.is_empty() {
        return vec![NO_DISCREPANCIES.to_string()];
    }

    discrepancies.iter().map(Discrepancy::to_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_code_stability() {
        assert_eq!(DiscrepancyKind::TableMissingInTarget.as_str(), "TABLE_MISSING_IN_TARGET");
        assert_eq!(DiscrepancyKind::TypeChanged.as_str(), "TYPE_CHANGED");
        for kind in DiscrepancyKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn table_messages() {
        let missing = Discrepancy::table(1, DiscrepancyKind::TableMissingInTarget, "Orders");
        assert_eq!(missing.to_line(), "1: Table \"Orders\" does not exist in the target database.");
        assert!(missing.column.is_none());

        let removed = Discrepancy::table(2, DiscrepancyKind::TableRemovedFromSource, "Audit");
        assert!(removed.message.contains("removed from the source"));
    }

    #[test]
    fn column_messages() {
        let d = Discrepancy::column(3, DiscrepancyKind::NullabilityChanged, "Orders", "total");
        assert_eq!(d.column.as_deref(), Some("total"));
        assert_eq!(
            d.message,
            "Column \"total\" of table \"Orders\" has a changed 'nullable' property."
        );

        let d = Discrepancy::column(4, DiscrepancyKind::ColumnRemovedFromSource, "Orders", "legacy");
        assert!(d.message.ends_with("has been removed from the source database."));
    }

    #[test]
    fn messages_follow_kind_at_either_level() {
        let d = Discrepancy::column(1, DiscrepancyKind::TableRemovedFromSource, "Orders", "id");
        assert_eq!(
            d.message,
            "Column \"id\" of table \"Orders\" has been removed from the source database."
        );

        let d = Discrepancy::table(2, DiscrepancyKind::TypeChanged, "Orders");
        assert_eq!(d.message, "Table \"Orders\" has a changed 'data type' property.");

        let d = Discrepancy::table(3, DiscrepancyKind::ColumnMissingInTarget, "Orders");
        assert!(d.message.ends_with("does not exist in the target database."));
    }

    #[test]
    fn render_empty_result() {
        assert_eq!(render_lines(&[]), vec![NO_DISCREPANCIES.to_string()]);
    }

    #[test]
    fn discrepancy_serialization() {
        let d = Discrepancy::table(1, DiscrepancyKind::TableMissingInTarget, "Orders");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("TABLE_MISSING_IN_TARGET"));
        assert!(!json.contains("\"column\""));
    }
}
