//! On-disk catalog snapshot.
//!
//! The catalog is persisted as a single JSON document. Writes go to a
//! `.tmp` sibling first and are renamed into place, so a crash mid-write
//! leaves the previous snapshot intact.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::CatalogResult;
use super::types::TableMeta;

/// File name of the snapshot inside a database directory.
pub const SNAPSHOT_FILE: &str = "catalog.json";

/// Serializable view of the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub last_table_id: u64,
    pub saved_at: DateTime<Utc>,
    pub tables: Vec<TableMeta>,
}

impl CatalogSnapshot {
    pub fn new(last_table_id: u64, mut tables: Vec<TableMeta>) -> Self {
        tables.sort_by_key(|t| t.id);
        Self {
            last_table_id,
            saved_at: Utc::now(),
            tables,
        }
    }

    /// Read a snapshot from `path`.
    pub fn read(path: &Path) -> CatalogResult<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Atomically replace the snapshot at `path`.
    pub fn write(&self, path: &Path) -> CatalogResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        let json = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
