//! Drives an operator tree to completion.

use std::io::Write;

use tracing::debug;

use super::error::{ExecuteError, ExecuteResult};
use super::operators::Operator;
use super::result::ResultSet;

/// Pulls every tuple from a root operator.
///
/// There is one driving loop per query; nothing below the root runs
/// concurrently with it.
pub struct QueryExecutor;

impl QueryExecutor {
    /// Write each result row as one line to `out`. Returns the row count.
    ///
    /// On error, rows already written stay written.
    pub fn execute<W: Write>(root: &mut dyn Operator, mut out: W) -> ExecuteResult<usize> {
        let mut count = 0;
        while let Some(tuple) = root.next_tuple()? {
            writeln!(out, "{}", tuple).map_err(|e| ExecuteError::io("query output", e))?;
            count += 1;
        }
        out.flush().map_err(|e| ExecuteError::io("query output", e))?;
        debug!(rows = count, "query drained");
        Ok(count)
    }

    /// Collect every result row in memory.
    pub fn collect(root: &mut dyn Operator, columns: Vec<String>) -> ExecuteResult<ResultSet> {
        let mut result = ResultSet::new(columns);
        while let Some(tuple) = root.next_tuple()? {
            result.push(tuple);
        }
        debug!(rows = result.len(), "query collected");
        Ok(result)
    }
}
