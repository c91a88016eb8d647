//! Schema comparison between an expected and an actual schema
//!
//! Tables and columns are matched by name, case-insensitively. The first
//! match wins when several names fold to the same value.
//!
//! Discrepancies come out in a fixed order: for each expected table (in
//! expected order) either a missing-table finding, or its column findings
//! (expected columns first, then target-only columns in actual order). After
//! that, one finding per target-only table in actual order.

use schemecheck_core::{
    duplicate_names, render_lines, Column, Discrepancy, DiscrepancyKind, Schema, Table,
};

/// Result of comparing two schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaComparison {
    /// Findings, numbered from 1 in emission order
    pub discrepancies: Vec<Discrepancy>,
}

impl SchemaComparison {
    /// Compare `expected` against `actual`
    ///
    /// Neither input is modified. Every difference found is reported; nothing
    /// is deduplicated.
    pub fn compare(expected: &Schema, actual: &Schema) -> Self {
        warn_on_ambiguous_names("expected", expected);
        warn_on_ambiguous_names("actual", actual);

        let mut findings = Findings::default();

        for expected_table in &expected.tables {
            match actual.find_table(&expected_table.name) {
                Some(actual_table) => compare_columns(&mut findings, expected_table, actual_table),
                None => findings.table(DiscrepancyKind::TableMissingInTarget, &expected_table.name),
            }
        }

        for actual_table in &actual.tables {
            if expected.find_table(&actual_table.name).is_none() {
                findings.table(DiscrepancyKind::TableRemovedFromSource, &actual_table.name);
            }
        }

        tracing::debug!(
            expected_tables = expected.len(),
            actual_tables = actual.len(),
            discrepancies = findings.items.len(),
            "schema comparison finished"
        );

        Self {
            discrepancies: findings.items,
        }
    }

    /// Schemas are equivalent under the checked attributes
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.discrepancies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Numbered lines for display
    pub fn lines(&self) -> Vec<String> {
        render_lines(&self.discrepancies)
    }

    /// Take the findings
    pub fn into_discrepancies(self) -> Vec<Discrepancy> {
        self.discrepancies
    }
}

/// Append-only, self-numbering list of findings
#[derive(Default)]
struct Findings {
    items: Vec<Discrepancy>,
}

impl Findings {
    fn next_number(&self) -> usize {
        self.items.len() + 1
    }

    fn table(&mut self, kind: DiscrepancyKind, table: &str) {
        let d = Discrepancy::table(self.next_number(), kind, table);
        self.items.push(d);
    }

    fn column(&mut self, kind: DiscrepancyKind, table: &str, column: &str) -> &mut Discrepancy {
        let d = Discrepancy::column(self.next_number(), kind, table, column);
        self.items.push(d);
        let last = self.items.len() - 1;
        &mut self.items[last]
    }
}

/// Column findings for one matched table pair
fn compare_columns(findings: &mut Findings, expected: &Table, actual: &Table) {
    for expected_col in &expected.columns {
        match actual.find_column(&expected_col.name) {
            Some(actual_col) => compare_column(findings, &expected.name, expected_col, actual_col),
            None => {
                findings.column(
                    DiscrepancyKind::ColumnMissingInTarget,
                    &expected.name,
                    &expected_col.name,
                );
            }
        }
    }

    for actual_col in &actual.columns {
        if expected.find_column(&actual_col.name).is_none() {
            findings.column(
                DiscrepancyKind::ColumnRemovedFromSource,
                &actual.name,
                &actual_col.name,
            );
        }
    }
}

/// Report the first differing attribute: primary key, then nullability, then type
fn compare_column(findings: &mut Findings, table: &str, expected: &Column, actual: &Column) {
    let change = if expected.is_primary_key != actual.is_primary_key {
        Some((
            DiscrepancyKind::PrimaryKeyChanged,
            key_label(expected.is_primary_key),
            key_label(actual.is_primary_key),
        ))
    } else if expected.is_nullable != actual.is_nullable {
        Some((
            DiscrepancyKind::NullabilityChanged,
            null_label(expected.is_nullable),
            null_label(actual.is_nullable),
        ))
    } else if expected.db_type != actual.db_type {
        Some((
            DiscrepancyKind::TypeChanged,
            expected.db_type.as_str(),
            actual.db_type.as_str(),
        ))
    } else {
        None
    };

    if let Some((kind, was, now)) = change {
        let d = findings.column(kind, table, &expected.name);
        d.expected = Some(was.to_string());
        d.actual = Some(now.to_string());
    }
}

fn key_label(is_primary_key: bool) -> &'static str {
    if is_primary_key {
        "PRIMARY KEY"
    } else {
        "NOT PRIMARY KEY"
    }
}

fn null_label(is_nullable: bool) -> &'static str {
    if is_nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

/// First-match semantics apply to duplicate names; make them visible in logs
fn warn_on_ambiguous_names(side: &str, schema: &Schema) {
    for name in ambiguous_names(schema) {
        tracing::warn!(side, name = %name, "name is ambiguous after case folding, first match wins");
    }
}

/// Table names, then `table.column` names, that collide after case folding
fn ambiguous_names(schema: &Schema) -> Vec<String> {
    let mut names: Vec<String> = duplicate_names(schema.table_names())
        .into_iter()
        .map(str::to_string)
        .collect();

    for table in &schema.tables {
        names.extend(
            duplicate_names(table.column_names())
                .into_iter()
                .map(|column| format!("{}.{}", table.name, column)),
        );
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn orders_table() -> Table {
        Table::new("Orders", "dbo").with_primary_key(true).with_columns(vec![
            Column::new(1, "id", "int").primary_key().with_nullable(false),
            Column::new(2, "total", "decimal"),
        ])
    }

    fn kinds(comparison: &SchemaComparison) -> Vec<DiscrepancyKind> {
        comparison.discrepancies.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_no_discrepancies() {
        let schema = Schema::from_tables(vec![orders_table()]);
        let comparison = SchemaComparison::compare(&schema, &schema.clone());

        assert!(comparison.is_clean());
        assert_eq!(comparison.lines(), vec![schemecheck_core::NO_DISCREPANCIES.to_string()]);
    }

    #[test]
    fn test_empty_schemas() {
        let comparison = SchemaComparison::compare(&Schema::new(), &Schema::new());
        assert!(comparison.is_clean());
    }

    #[test]
    fn test_table_missing_in_target() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let comparison = SchemaComparison::compare(&expected, &Schema::new());

        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::TableMissingInTarget]);
        assert_eq!(comparison.discrepancies[0].table, "Orders");
        assert_eq!(comparison.discrepancies[0].number, 1);
    }

    #[test]
    fn test_table_removed_from_source() {
        let actual = Schema::from_tables(vec![Table::new("Audit", "dbo")]);
        let comparison = SchemaComparison::compare(&Schema::new(), &actual);

        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::TableRemovedFromSource]);
        assert_eq!(comparison.discrepancies[0].table, "Audit");
    }

    #[test]
    fn test_table_names_case_insensitive() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let mut renamed = orders_table();
        renamed.name = "ORDERS".to_string();
        renamed.columns[1].name = "Total".to_string();
        let actual = Schema::from_tables(vec![renamed]);

        assert!(SchemaComparison::compare(&expected, &actual).is_clean());
    }

    #[test]
    fn test_column_missing_and_removed() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let actual = Schema::from_tables(vec![Table::new("Orders", "dbo").with_columns(vec![
            Column::new(1, "id", "int").primary_key().with_nullable(false),
            Column::new(2, "amount", "decimal"),
        ])]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(
            kinds(&comparison),
            vec![DiscrepancyKind::ColumnMissingInTarget, DiscrepancyKind::ColumnRemovedFromSource]
        );
        assert_eq!(comparison.discrepancies[0].column.as_deref(), Some("total"));
        assert_eq!(comparison.discrepancies[1].column.as_deref(), Some("amount"));
    }

    #[test]
    fn test_primary_key_checked_first() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let actual = Schema::from_tables(vec![Table::new("Orders", "dbo").with_columns(vec![
            // key, nullability and type all differ
            Column::new(1, "id", "bigint"),
            Column::new(2, "total", "decimal"),
        ])]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::PrimaryKeyChanged]);
        assert_eq!(comparison.discrepancies[0].expected.as_deref(), Some("PRIMARY KEY"));
        assert_eq!(comparison.discrepancies[0].actual.as_deref(), Some("NOT PRIMARY KEY"));
    }

    #[test]
    fn test_nullability_before_type() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let actual = Schema::from_tables(vec![Table::new("Orders", "dbo").with_columns(vec![
            Column::new(1, "id", "int").primary_key().with_nullable(false),
            Column::new(2, "total", "money").with_nullable(false),
        ])]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(comparison.len(), 1);
        assert_eq!(comparison.discrepancies[0].kind, DiscrepancyKind::NullabilityChanged);
        assert_eq!(comparison.discrepancies[0].expected.as_deref(), Some("NULL"));
        assert_eq!(comparison.discrepancies[0].actual.as_deref(), Some("NOT NULL"));
    }

    #[test]
    fn test_type_change() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let actual = Schema::from_tables(vec![Table::new("Orders", "dbo").with_columns(vec![
            Column::new(1, "id", "int").primary_key().with_nullable(false),
            Column::new(2, "total", "numeric"),
        ])]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::TypeChanged]);
        assert_eq!(comparison.discrepancies[0].expected.as_deref(), Some("decimal"));
        assert_eq!(comparison.discrepancies[0].actual.as_deref(), Some("numeric"));
    }

    #[test]
    fn test_type_comparison_is_exact() {
        let expected = Schema::from_tables(vec![Table::new("t", "dbo")
            .with_columns(vec![Column::new(1, "c", "int")])]);
        let actual = Schema::from_tables(vec![Table::new("t", "dbo")
            .with_columns(vec![Column::new(1, "c", "INT")])]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::TypeChanged]);
    }

    #[test]
    fn test_unchecked_attributes_ignored() {
        let expected = Schema::from_tables(vec![orders_table()]);
        let mut changed = orders_table();
        changed.schema_name = "sales".to_string();
        changed.row_count = 99;
        changed.has_primary_key = false;
        changed.columns[0].ordinal = 7;
        changed.columns[1] = changed.columns[1]
            .clone()
            .identity()
            .with_byte_length(17)
            .with_precision(38, 4)
            .with_remark("grand total");

        let actual = Schema::from_tables(vec![changed]);
        assert!(SchemaComparison::compare(&expected, &actual).is_clean());
    }

    #[test]
    fn test_duplicate_names_first_match_wins() {
        let expected = Schema::from_tables(vec![Table::new("Foo", "dbo")
            .with_columns(vec![Column::new(1, "a", "int")])]);
        let actual = Schema::from_tables(vec![
            Table::new("foo", "dbo").with_columns(vec![Column::new(1, "a", "int")]),
            Table::new("FOO", "dbo").with_columns(vec![Column::new(1, "a", "bigint")]),
        ]);

        // both actual tables match "Foo"; only the first is compared
        let comparison = SchemaComparison::compare(&expected, &actual);
        assert!(comparison.is_clean());
    }

    #[test]
    fn test_numbering_is_sequential() {
        let expected = Schema::from_tables(vec![
            Table::new("A", "dbo"),
            orders_table(),
        ]);
        let actual = Schema::from_tables(vec![
            Table::new("Orders", "dbo").with_columns(vec![
                Column::new(1, "id", "int").with_nullable(false),
            ]),
            Table::new("Z", "dbo"),
        ]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        let numbers: Vec<usize> = comparison.discrepancies.iter().map(|d| d.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(
            kinds(&comparison),
            vec![
                DiscrepancyKind::TableMissingInTarget,
                DiscrepancyKind::PrimaryKeyChanged,
                DiscrepancyKind::ColumnMissingInTarget,
                DiscrepancyKind::TableRemovedFromSource,
            ]
        );
        assert!(comparison.lines()[0].starts_with("1: Table \"A\""));
        assert_eq!(comparison.discrepancies[1].table, "Orders");
        assert_eq!(comparison.discrepancies[2].table, "Orders");
    }

    #[test]
    fn test_duplicate_expected_tables_share_one_target() {
        let expected = Schema::from_tables(vec![
            Table::new("Foo", "dbo").with_columns(vec![Column::new(1, "a", "int")]),
            Table::new("FOO", "dbo").with_columns(vec![Column::new(1, "a", "bigint")]),
        ]);
        let actual = Schema::from_tables(vec![
            Table::new("foo", "dbo").with_columns(vec![Column::new(1, "a", "int")]),
        ]);

        // each expected table is compared against the single "foo"
        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::TypeChanged]);
        assert_eq!(comparison.discrepancies[0].table, "FOO");
        assert_eq!(comparison.discrepancies[0].actual.as_deref(), Some("int"));
    }

    #[test]
    fn test_duplicate_expected_columns_share_one_target() {
        let expected = Schema::from_tables(vec![Table::new("t", "dbo").with_columns(vec![
            Column::new(1, "Id", "int"),
            Column::new(2, "ID", "int").with_nullable(false),
        ])]);
        let actual = Schema::from_tables(vec![Table::new("t", "dbo")
            .with_columns(vec![Column::new(1, "id", "int")])]);

        let comparison = SchemaComparison::compare(&expected, &actual);
        assert_eq!(kinds(&comparison), vec![DiscrepancyKind::NullabilityChanged]);
        assert_eq!(comparison.discrepancies[0].column.as_deref(), Some("ID"));
    }

    #[test]
    fn test_ambiguous_names_detected() {
        let schema = Schema::from_tables(vec![
            Table::new("Orders", "dbo").with_columns(vec![
                Column::new(1, "Id", "int"),
                Column::new(2, "ID", "int"),
            ]),
            Table::new("ORDERS", "dbo"),
            Table::new("Users", "dbo"),
        ]);

        assert_eq!(ambiguous_names(&schema), vec!["ORDERS", "Orders.ID"]);
        assert!(ambiguous_names(&Schema::from_tables(vec![orders_table()])).is_empty());
    }
}
