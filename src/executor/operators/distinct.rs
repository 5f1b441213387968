//! Duplicate elimination.

use std::collections::HashSet;

use super::{MaterializeState, Operator};
use crate::executor::error::ExecuteResult;
use crate::executor::tuple::Tuple;

/// Drains its child and keeps the first occurrence of every distinct tuple.
pub struct DistinctOperator {
    source: Box<dyn Operator>,
    state: MaterializeState,
}

impl DistinctOperator {
    pub fn new(source: Box<dyn Operator>) -> Self {
        Self {
            source,
            state: MaterializeState::NotMaterialized,
        }
    }

    fn materialize(&mut self) -> ExecuteResult<()> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        while let Some(tuple) = self.source.next_tuple()? {
            if seen.insert(tuple.clone()) {
                unique.push(tuple);
            }
        }
        self.state = MaterializeState::ready(unique);
        Ok(())
    }
}

impl Operator for DistinctOperator {
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
