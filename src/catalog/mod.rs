//! Catalog module for schema management.
//!
//! The catalog maps table names to ordered column lists and backing data
//! files. It is loaded from a schema file and can persist itself as a JSON
//! snapshot in the database directory.

mod error;
mod manager;
mod schema;
mod snapshot;
mod types;

pub use error::{CatalogError, CatalogResult};
pub use manager::Catalog;
pub use schema::{SchemaLoader, TableDecl, DATA_FILE_EXTENSION};
pub use snapshot::{CatalogSnapshot, SNAPSHOT_FILE};
pub use types::{normalize_name, ColumnMeta, DataType, TableMeta};
