//! Test fixtures for provider integration tests
//!
//! Reusable table definitions shaped like a small order-processing database.

#![allow(dead_code)]

use schemecheck_core::{Column, Table};

/// Users table with identity key and a wide-character display name
pub fn users_table() -> Table {
    Table::new("Users", "dbo")
        .with_row_count(42)
        .with_primary_key(true)
        .with_columns(vec![
            Column::new(1, "Id", "int")
                .primary_key()
                .identity()
                .with_nullable(false)
                .with_byte_length(4)
                .with_precision(10, 0),
            Column::new(2, "Email", "varchar").with_nullable(false).with_byte_length(255),
            Column::new(3, "DisplayName", "nvarchar")
                .with_byte_length(200)
                .with_remark("shown in the header"),
        ])
}

/// Orders table with a decimal total
pub fn orders_table() -> Table {
    Table::new("Orders", "dbo")
        .with_row_count(1_000)
        .with_primary_key(true)
        .with_columns(vec![
            Column::new(1, "id", "int")
                .primary_key()
                .with_nullable(false)
                .with_byte_length(4)
                .with_precision(10, 0),
            Column::new(2, "user_id", "int").with_nullable(false).with_byte_length(4),
            Column::new(3, "total", "decimal").with_byte_length(9).with_precision(18, 2),
        ])
}

/// Heap table without a primary key
pub fn audit_table() -> Table {
    Table::new("Audit", "dbo")
        .with_row_count(7)
        .with_columns(vec![
            Column::new(1, "at", "datetime2").with_nullable(false).with_byte_length(8),
            Column::new(2, "message", "ntext").with_byte_length(16),
        ])
}

/// All fixture tables
pub fn all_tables() -> Vec<Table> {
    vec![users_table(), orders_table(), audit_table()]
}
