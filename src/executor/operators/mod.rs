//! Volcano-style operators for query execution.
//!
//! Each operator implements the iterator model where tuples are pulled
//! one at a time through the tree. Operators own their children; the root
//! is driven by [`QueryExecutor`](super::QueryExecutor).

mod distinct;
mod filter;
mod group_sum;
mod join;
mod project;
mod scan;
mod sort;

pub use distinct::DistinctOperator;
pub use filter::FilterOperator;
pub use group_sum::GroupSumOperator;
pub use join::JoinOperator;
pub use project::ProjectOperator;
pub use scan::ScanOperator;
pub use sort::{SortKey, SortOperator};

use super::error::ExecuteResult;
use super::tuple::Tuple;

/// Trait for all query operators.
pub trait Operator: Send {
    /// Get the next tuple, or None if exhausted.
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>>;

    /// Rewind to the start so the same sequence is produced again.
    ///
    /// Safe to call before the first `next_tuple` and after exhaustion.
    fn reset(&mut self) -> ExecuteResult<()>;
}

/// Progress of an operator that must drain its input before emitting.
#[derive(Debug, Default)]
pub enum MaterializeState {
    #[default]
    NotMaterialized,
    Materialized { data: Vec<Tuple>, cursor: usize },
}

impl MaterializeState {
    pub fn ready(data: Vec<Tuple>) -> Self {
        MaterializeState::Materialized { data, cursor: 0 }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, MaterializeState::Materialized { .. })
    }

    /// Emit the next materialized tuple.
    pub fn advance(&mut self) -> Option<Tuple> {
        match self {
            MaterializeState::NotMaterialized => None,
            MaterializeState::Materialized { data, cursor } => {
                let next = data.get(*cursor).cloned();
                if next.is_some() {
                    *cursor += 1;
                }
                next
            }
        }
    }
}

/// Drain an operator into a vector.
pub(crate) fn drain(op: &mut dyn Operator) -> ExecuteResult<Vec<Tuple>> {
    let mut out = Vec::new();
    while let Some(t) = op.next_tuple()? {
        out.push(t);
    }
    Ok(out)
}

/// In-memory source used by operator tests.
#[cfg(test)]
pub(crate) struct VecSource {
    rows: Vec<Tuple>,
    position: usize,
    pub resets: usize,
}

#[cfg(test)]
impl VecSource {
    pub fn new(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.iter().copied().collect()).collect(),
            position: 0,
            resets: 0,
        }
    }

    pub fn boxed(rows: &[&[&str]]) -> Box<dyn Operator> {
        Box::new(Self::new(rows))
    }
}

#[cfg(test)]
impl Operator for VecSource {
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn reset(&mut self) -> ExecuteResult<()> {
        self.position = 0;
        self.resets += 1;
        Ok(())
    }
}

/// Render drained tuples as strings for compact assertions.
#[cfg(test)]
pub(crate) fn rows(op: &mut dyn Operator) -> Vec<String> {
    drain(op).unwrap().iter().map(|t| t.to_string()).collect()
}
