//! Schema file loading.
//!
//! A schema file lists one table per line:
//!
//! ```text
//! # comment
//! Student sid name age
//! Course cid name
//! ```
//!
//! Each table's rows live in `<data_dir>/<TableName>.csv`.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use super::manager::Catalog;
use super::types::{ColumnMeta, DataType};

/// Extension of table data files.
pub const DATA_FILE_EXTENSION: &str = "csv";

/// A table declaration parsed from a schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDecl {
    pub name: String,
    pub columns: Vec<ColumnMeta>,
}

/// Loads schema files into a [`Catalog`].
pub struct SchemaLoader;

impl SchemaLoader {
    /// Parse schema text into table declarations.
    pub fn parse(text: &str) -> CatalogResult<Vec<TableDecl>> {
        let mut decls = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let name = parts.next().unwrap_or_default().to_string();
            let columns: Vec<ColumnMeta> = parts
                .map(|c| ColumnMeta::new(c, DataType::Text))
                .collect();

            if columns.is_empty() {
                return Err(CatalogError::InvalidSchema {
                    line: idx + 1,
                    reason: format!("table '{}' declares no columns", name),
                });
            }
            decls.push(TableDecl { name, columns });
        }
        Ok(decls)
    }

    /// Register every table of `schema_file` in `catalog`, pointing at `data_dir`.
    ///
    /// Tables already present must match the file exactly, which makes
    /// repeated loads of the same schema a no-op.
    pub fn load_into(catalog: &Catalog, schema_file: &Path, data_dir: &Path) -> CatalogResult<usize> {
        let text = fs::read_to_string(schema_file)?;
        let decls = Self::parse(&text)?;

        let mut registered = 0;
        for decl in decls {
            let data_file = data_dir.join(format!("{}.{}", decl.name, DATA_FILE_EXTENSION));

            match catalog.get_table(&decl.name) {
                Ok(existing) => {
                    if !existing.same_columns(&decl.columns) {
                        return Err(CatalogError::SchemaMismatch {
                            table: existing.name.clone(),
                            reason: format!(
                                "catalog has [{}] but schema file has [{}]",
                                existing.column_names().join(", "),
                                decl.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "),
                            ),
                        });
                    }
                    if existing.data_file != data_file {
                        return Err(CatalogError::SchemaMismatch {
                            table: existing.name.clone(),
                            reason: format!(
                                "catalog points to {} but expected {}",
                                existing.data_file.display(),
                                data_file.display()
                            ),
                        });
                    }
                    debug!(table = %existing.name, "schema already registered");
                }
                Err(CatalogError::TableNotFound(_)) => {
                    catalog.register_table(&decl.name, decl.columns, &data_file)?;
                    registered += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(schema = %schema_file.display(), registered, "loaded schema");
        Ok(registered)
    }
}
