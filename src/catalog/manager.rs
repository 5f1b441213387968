//! Catalog manager for schema persistence and retrieval.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use super::snapshot::{CatalogSnapshot, SNAPSHOT_FILE};
use super::types::{normalize_name, ColumnMeta, TableMeta};

#[derive(Debug, Default)]
struct CatalogState {
    tables: BTreeMap<u64, Arc<TableMeta>>,
    ids_by_name: HashMap<String, u64>,
    last_table_id: u64,
}

impl CatalogState {
    fn from_snapshot(snap: CatalogSnapshot) -> Self {
        let mut state = CatalogState {
            last_table_id: snap.last_table_id,
            ..Default::default()
        };
        for table in snap.tables {
            state.ids_by_name.insert(normalize_name(&table.name), table.id);
            state.tables.insert(table.id, Arc::new(table));
        }
        state
    }

    fn snapshot(&self) -> CatalogSnapshot {
        let tables = self.tables.values().map(|t| t.as_ref().clone()).collect();
        CatalogSnapshot::new(self.last_table_id, tables)
    }
}

/// The catalog maps table names to their schemas and data files.
///
/// A `Catalog` is an explicit handle: the planner and the scan operators
/// receive it by reference, and its lifetime is owned by whoever opened it.
pub struct Catalog {
    snapshot_path: Option<PathBuf>,
    state: RwLock<CatalogState>,
}

impl Catalog {
    /// Create an empty catalog that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            snapshot_path: None,
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Open the catalog persisted under `db_root`, or an empty one if none exists yet.
    pub fn open(db_root: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = db_root.as_ref().join(SNAPSHOT_FILE);
        let state = if path.exists() {
            let snap = CatalogSnapshot::read(&path)?;
            info!(path = %path.display(), tables = snap.tables.len(), "loaded catalog snapshot");
            CatalogState::from_snapshot(snap)
        } else {
            CatalogState::default()
        };

        Ok(Self {
            snapshot_path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Location of the snapshot file, if this catalog is persistent.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> CatalogResult<Arc<TableMeta>> {
        let state = self.state.read();
        state.ids_by_name
            .get(&normalize_name(name))
            .and_then(|id| state.tables.get(id))
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    /// Get a table by id.
    pub fn get_table_by_id(&self, id: u64) -> Option<Arc<TableMeta>> {
        self.state.read().tables.get(&id).cloned()
    }

    /// Check if a table exists.
    pub fn table_exists(&self, name: &str) -> bool {
        self.state.read().ids_by_name.contains_key(&normalize_name(name))
    }

    /// List all tables, sorted by name.
    pub fn list_tables(&self) -> Vec<Arc<TableMeta>> {
        let mut tables: Vec<_> = self.state.read().tables.values().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Register a table whose data already lives in `data_file`.
    pub fn register_table(
        &self,
        name: &str,
        columns: Vec<ColumnMeta>,
        data_file: impl AsRef<Path>,
    ) -> CatalogResult<Arc<TableMeta>> {
        let norm = normalize_name(name);
        if columns.is_empty() {
            return Err(CatalogError::NoColumns(norm));
        }

        let mut state = self.state.write();
        if state.ids_by_name.contains_key(&norm) {
            return Err(CatalogError::TableExists(norm));
        }

        state.last_table_id += 1;
        let id = state.last_table_id;
        let meta = Arc::new(TableMeta::new(id, &norm, columns, data_file));

        state.tables.insert(id, Arc::clone(&meta));
        state.ids_by_name.insert(norm, id);
        debug!(table = %meta.name, id, "registered table");

        self.flush_locked(&state)?;
        Ok(meta)
    }

    /// Drop a table's metadata, optionally deleting its data file.
    ///
    /// Returns `false` if the table was not registered.
    pub fn drop_table(&self, name: &str, delete_data_file: bool) -> CatalogResult<bool> {
        let removed = {
            let mut state = self.state.write();
            let Some(id) = state.ids_by_name.remove(&normalize_name(name)) else {
                return Ok(false);
            };
            let removed = state.tables.remove(&id);
            self.flush_locked(&state)?;
            removed
        };

        if let (true, Some(meta)) = (delete_data_file, removed) {
            match fs::remove_file(&meta.data_file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    /// Persist the catalog, if it has a snapshot location.
    pub fn flush(&self) -> CatalogResult<()> {
        let state = self.state.read();
        self.flush_locked(&state)
    }

    fn flush_locked(&self, state: &CatalogState) -> CatalogResult<()> {
        if let Some(path) = &self.snapshot_path {
            state.snapshot().write(path)?;
            debug!(path = %path.display(), "flushed catalog");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::DataType;
    use tempfile::TempDir;

    fn cols(names: &[&str]) -> Vec<ColumnMeta> {
        names.iter().map(|n| ColumnMeta::new(n, DataType::Integer)).collect()
    }

    #[test]
    fn test_register_and_get_table() {
        let catalog = Catalog::in_memory();
        let meta = catalog.register_table("Student", cols(&["sid", "name"]), "Student.csv").unwrap();

        assert_eq!(meta.id, 1);
        let fetched = catalog.get_table("  STUDENT ").unwrap();
        assert_eq!(fetched.name, "student");
        assert_eq!(fetched.column_count(), 2);
        assert_eq!(catalog.get_table_by_id(1).unwrap().name, "student");
    }

    #[test]
    fn test_missing_table() {
        let catalog = Catalog::in_memory();
        assert!(matches!(catalog.get_table("nope"), Err(CatalogError::TableNotFound(_))));
        assert!(!catalog.table_exists("nope"));
    }

    #[test]
    fn test_duplicate_and_empty_tables_rejected() {
        let catalog = Catalog::in_memory();
        catalog.register_table("t", cols(&["a"]), "t.csv").unwrap();

        let dup = catalog.register_table("T", cols(&["a"]), "t.csv");
        assert!(matches!(dup, Err(CatalogError::TableExists(_))));

        let empty = catalog.register_table("u", vec![], "u.csv");
        assert!(matches!(empty, Err(CatalogError::NoColumns(_))));
    }

    #[test]
    fn test_list_tables_sorted() {
        let catalog = Catalog::in_memory();
        for name in ["users", "orders", "products"] {
            catalog.register_table(name, cols(&["id"]), format!("{}.csv", name)).unwrap();
        }
        let names: Vec<_> = catalog.list_tables().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["orders", "products", "users"]);
    }

    #[test]
    fn test_drop_table() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("t.csv");
        fs::write(&data, "1\n").unwrap();

        let catalog = Catalog::in_memory();
        catalog.register_table("t", cols(&["a"]), &data).unwrap();

        assert!(catalog.drop_table("t", true).unwrap());
        assert!(!catalog.table_exists("t"));
        assert!(!data.exists());
        assert!(!catalog.drop_table("t", true).unwrap());
    }

    #[test]
    fn test_persists_across_open() {
        let dir = TempDir::new().unwrap();
        {
            let catalog = Catalog::open(dir.path()).unwrap();
            catalog.register_table("a", cols(&["x"]), "a.csv").unwrap();
            catalog.register_table("b", cols(&["y", "z"]), "b.csv").unwrap();
            catalog.drop_table("a", false).unwrap();
        }

        let reopened = Catalog::open(dir.path()).unwrap();
        assert!(!reopened.table_exists("a"));
        assert_eq!(reopened.get_table("b").unwrap().column_names(), vec!["y", "z"]);

        // Ids keep increasing after reload.
        let c = reopened.register_table("c", cols(&["w"]), "c.csv").unwrap();
        assert_eq!(c.id, 3);
    }
}
