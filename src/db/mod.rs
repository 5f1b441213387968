//! High-level Database API.
//!
//! This module ties the catalog, planner and executor together behind a
//! single handle opened on a database directory.

mod api;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{Database, DatabaseConfig, DatabaseError, DatabaseResult};
