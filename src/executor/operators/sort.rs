//! In-memory sort.

use std::cmp::Ordering;

use super::{drain, MaterializeState, Operator};
use crate::executor::error::ExecuteResult;
use crate::executor::eval::parse_int;
use crate::executor::tuple::Tuple;

/// One ORDER BY key, already resolved to a field offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub index: usize,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(index: usize) -> Self {
        Self {
            index,
            ascending: true,
        }
    }

    pub fn desc(index: usize) -> Self {
        Self {
            index,
            ascending: false,
        }
    }
}

/// Drains its child, then emits the tuples ordered by integer keys.
///
/// Rows whose keys all tie are ordered field-by-field as text and then by
/// length, so the output order never depends on input order.
pub struct SortOperator {
    source: Box<dyn Operator>,
    keys: Vec<SortKey>,
    state: MaterializeState,
}

impl SortOperator {
    pub fn new(source: Box<dyn Operator>, keys: Vec<SortKey>) -> Self {
        Self {
            source,
            keys,
            state: MaterializeState::NotMaterialized,
        }
    }

    fn materialize(&mut self) -> ExecuteResult<()> {
        let tuples = drain(self.source.as_mut())?;

        // Parse every key once up front; a non-integer key fails the query.
        let mut keyed = tuples
            .into_iter()
            .map(|t| {
                let parsed = self
                    .keys
                    .iter()
                    .map(|k| t.get(k.index).and_then(parse_int))
                    .collect::<ExecuteResult<Vec<i64>>>()?;
                Ok((parsed, t))
            })
            .collect::<ExecuteResult<Vec<_>>>()?;

        let keys = &self.keys;
        keyed.sort_by(|(ka, ta), (kb, tb)| {
            keys.iter()
                .zip(ka.iter().zip(kb.iter()))
                .map(|(key, (a, b))| if key.ascending { a.cmp(b) } else { b.cmp(a) })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| ta.values().cmp(tb.values()))
        });

        self.state = MaterializeState::ready(keyed.into_iter().map(|(_, t)| t).collect());
        Ok(())
    }
}

impl Operator for SortOperator {
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>> {
        if !self.state.is_materialized() {
            self.materialize()?;
        }
        Ok(self.state.advance())
    }

    fn reset(&mut self) -> ExecuteResult<()> {
        self.source.reset()?;
        self.state = MaterializeState::NotMaterialized;
        Ok(())
    }
}
