//! Projection operator.

use super::Operator;
use crate::executor::error::ExecuteResult;
use crate::executor::resolver::ColumnResolver;
use crate::executor::tuple::Tuple;
use crate::sql::ColumnRef;

/// Copies a fixed list of fields out of each child tuple.
pub struct ProjectOperator {
    source: Box<dyn Operator>,
    indexes: Vec<usize>,
    output_refs: Vec<String>,
}

impl ProjectOperator {
    /// Resolve `columns` against the child's schema. Repeats and reordering are allowed.
    pub fn new(
        source: Box<dyn Operator>,
        columns: &[ColumnRef],
        resolver: &dyn ColumnResolver,
    ) -> ExecuteResult<Self> {
        let indexes = columns
            .iter()
            .map(|c| resolver.resolve_ref(c))
            .collect::<ExecuteResult<Vec<_>>>()?;
        let output_refs = columns.iter().map(ColumnRef::normalized).collect();
        Ok(Self {
            source,
            indexes,
            output_refs,
        })
    }

    /// Normalized references naming the output fields.
    pub fn output_refs(&self) -> &[String] {
        &self.output_refs
    }
}

impl Operator for ProjectOperator {
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>> {
        match self.source.next_tuple()? {
            Some(tuple) => Ok(Some(tuple.pick(&self.indexes)?)),
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> ExecuteResult<()> {
        self.source.reset()
    }
}
