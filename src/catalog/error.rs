//! Catalog errors.

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("table must have at least one column: {0}")]
    NoColumns(String),

    #[error("invalid schema at line {line}: {reason}")]
    InvalidSchema { line: usize, reason: String },

    #[error("schema mismatch for table '{table}': {reason}")]
    SchemaMismatch { table: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted catalog snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
