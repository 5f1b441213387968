//! Shared fixture: a small university database on disk.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::catalog::{Catalog, SchemaLoader};

pub(crate) const SCHEMA: &str = "\
# university
Student sid name age
Enrolled sid cid mark
Course cid title credits
";

pub(crate) const STUDENT: &str = "1, ada, 22\n2, bob, 19\n3, cy, 25\n4, dee, 21\n";
pub(crate) const ENROLLED: &str = "1, 101, 80\n1, 102, 70\n2, 101, 65\n3, 103, 90\n3, 101, 50\n";
pub(crate) const COURSE: &str = "101, db, 4\n102, os, 3\n103, ml, 4\n";

/// Write `schema.txt` and `data/*.csv` under `root`.
pub(crate) fn write_university(root: &Path) {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(root.join("schema.txt"), SCHEMA).unwrap();
    fs::write(data.join("Student.csv"), STUDENT).unwrap();
    fs::write(data.join("Enrolled.csv"), ENROLLED).unwrap();
    fs::write(data.join("Course.csv"), COURSE).unwrap();
}

/// A database directory holding the university tables.
pub(crate) fn university_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_university(dir.path());
    dir
}

/// An in-memory catalog over the university tables. Keep the `TempDir` alive.
pub(crate) fn university() -> (TempDir, Catalog) {
    let dir = university_dir();
    let catalog = Catalog::in_memory();
    SchemaLoader::load_into(&catalog, &dir.path().join("schema.txt"), &dir.path().join("data")).unwrap();
    (dir, catalog)
}
