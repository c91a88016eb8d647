//! Schema model captured from a database catalog
//!
//! A [`Schema`] is an ordered list of [`Table`]s, each carrying its ordered
//! [`Column`]s. Values are built once per introspection or snapshot load and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Type names that store two bytes per character
const WIDE_CHAR_TYPES: &[&str] = &["nchar", "nvarchar", "ntext"];

/// A column of a table, as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// 1-based position within the table
    pub ordinal: i32,

    /// Column name
    pub name: String,

    /// Type name exactly as the catalog reports it (e.g. "int", "nvarchar")
    pub db_type: String,

    /// Column belongs to the table's primary key
    pub is_primary_key: bool,

    /// Column is an identity/auto-increment column
    pub is_identity: bool,

    /// Column accepts NULL
    pub is_nullable: bool,

    /// Raw storage length in bytes (-1 for unbounded types)
    pub byte_length: i32,

    /// Length in characters
    pub char_length: i32,

    /// Numeric precision
    pub precision: i32,

    /// Numeric scale
    pub scale: i32,

    /// Column description, empty if none
    pub remark: String,
}

impl Column {
    /// Create a nullable, non-key column with zeroed lengths
    pub fn new(ordinal: i32, name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
            db_type: db_type.into(),
            is_primary_key: false,
            is_identity: false,
            is_nullable: true,
            byte_length: 0,
            char_length: 0,
            precision: 0,
            scale: 0,
            remark: String::new(),
        }
    }

    /// Mark as primary key column
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Mark as identity column
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    /// Set byte length; char length is derived from it
    pub fn with_byte_length(mut self, byte_length: i32) -> Self {
        self.byte_length = byte_length;
        self.char_length = Self::derive_char_length(&self.db_type, byte_length);
        self
    }

    /// Set precision and scale
    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Set the description
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Character length for a type reported in bytes
    ///
    /// Wide-character string types report half their byte length when the
    /// byte length is positive. Everything else reports the byte length as is.
    pub fn derive_char_length(db_type: &str, byte_length: i32) -> i32 {
        let wide = WIDE_CHAR_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(db_type));

        if wide && byte_length > 0 {
            byte_length / 2
        } else {
            byte_length
        }
    }
}

/// A user table and its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Table name
    pub name: String,

    /// Owning namespace (e.g. "dbo", "public")
    pub schema_name: String,

    /// Row count at capture time (informational)
    pub row_count: i64,

    /// At least one primary-key index exists on the table
    pub has_primary_key: bool,

    /// Columns in ordinal order
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a table without columns
    ///
    /// Columns are fetched in a second round trip and attached with
    /// [`Table::with_columns`].
    pub fn new(name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_name: schema_name.into(),
            row_count: 0,
            has_primary_key: false,
            columns: Vec::new(),
        }
    }

    /// Set the captured row count
    pub fn with_row_count(mut self, row_count: i64) -> Self {
        self.row_count = row_count;
        self
    }

    /// Set primary key existence
    pub fn with_primary_key(mut self, has_primary_key: bool) -> Self {
        self.has_primary_key = has_primary_key;
        self
    }

    /// Attach the column list
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Fully qualified name (`schema.table`)
    pub fn qualified_name(&self) -> String {
        if self.schema_name.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema_name, self.name)
        }
    }

    /// First column whose name matches case-insensitively
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| names_match(&c.name, name))
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// An ordered collection of tables
///
/// Serialized as a bare array of tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    /// Tables in capture order
    pub tables: Vec<Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Create a schema from tables
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// First table whose name matches case-insensitively
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| names_match(&t.name, name))
    }

    /// Get table names
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Total number of columns across all tables
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

impl FromIterator<Table> for Schema {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        Self::from_tables(iter.into_iter().collect())
    }
}

/// Case-insensitive identifier comparison, independent of locale
pub fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Names that occur more than once after case-folding, in first-seen order
pub fn duplicate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    let mut duplicates: Vec<&str> = Vec::new();

    for name in names {
        if seen.iter().any(|s| names_match(s, name)) {
            if !duplicates.iter().any(|d| names_match(d, name)) {
                duplicates.push(name);
            }
        } else {
            seen.push(name);
        }
    }

    duplicates
}
