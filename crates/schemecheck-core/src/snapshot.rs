//! Snapshot files
//!
//! A snapshot is the JSON encoding of a [`Schema`]: an array of tables, each
//! with a nested `columns` array. Output is indented so snapshots can be
//! diffed with ordinary text tools. Unknown fields are ignored on read;
//! missing or mistyped fields are an error.

use crate::schema::Schema;
use std::path::Path;

/// Snapshot error types
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot: {0}")]
    Format(String),

    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Snapshot file already exists: {0}")]
    AlreadyExists(String),
}

/// Encode a schema as indented JSON bytes
pub fn serialize(schema: &Schema) -> Result<Vec<u8>, SnapshotError> {
    serde_json::to_vec_pretty(schema).map_err(|e| SnapshotError::Format(e.to_string()))
}

/// Decode a schema from JSON bytes
pub fn deserialize(bytes: &[u8]) -> Result<Schema, SnapshotError> {
    serde_json::from_slice(bytes).map_err(|e| SnapshotError::Format(e.to_string()))
}

/// Write a snapshot file
///
/// An existing file is only replaced when `overwrite` is set.
pub fn save_to_file(schema: &Schema, path: &Path, overwrite: bool) -> Result<(), SnapshotError> {
    if path.exists() && !overwrite {
        return Err(SnapshotError::AlreadyExists(path.display().to_string()));
    }

    let bytes = serialize(schema)?;
    std::fs::write(path, bytes).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Read a snapshot file
pub fn load_from_file(path: &Path) -> Result<Schema, SnapshotError> {
    let bytes = std::fs::read(path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    deserialize(&bytes)
}
