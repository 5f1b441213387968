//! LightDB - A lightweight flat-file SQL query engine
//!
//! This crate answers single SELECT queries over tables stored as
//! comma-separated text files. A schema file names each table and its
//! columns; queries are planned into a tree of pull-based operators
//! (scan, selection, projection, nested-loop join, sort, grouped sum and
//! duplicate elimination) and the result rows are written one per line.
//!
//! # Example
//!
//! ```no_run
//! use lightdb::db::Database;
//!
//! let db = Database::open("./samples/db").unwrap();
//! let rows = db.query("SELECT Student.A FROM Student WHERE Student.B > 100").unwrap();
//! for line in rows.lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod catalog;
pub mod db;
pub mod executor;
pub mod logging;
pub mod planner;
pub mod sql;
