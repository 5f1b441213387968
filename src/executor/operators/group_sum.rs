//! Hash aggregation computing integer sums per group.

use std::collections::HashMap;

use super::{MaterializeState, Operator};
use crate::executor::error::{ExecuteError, ExecuteResult};
use crate::executor::eval::{eval_sum_arg, BoundExpr};
use crate::executor::resolver::ColumnResolver;
use crate::executor::tuple::Tuple;
use crate::sql::{ColumnRef, Expr};

/// Running state of one group.
#[derive(Debug)]
struct AggState {
    /// Output-key values from the first tuple seen for the group.
    keys: Vec<String>,
    sums: Vec<i64>,
}

/// Groups its input by a set of columns and sums one or more expressions.
///
/// Groups are emitted in the order they were first seen. With no grouping
/// columns every tuple lands in a single global group, which is emitted even
/// when the input is empty.
pub struct GroupSumOperator {
    source: Box<dyn Operator>,
    group_indexes: Vec<usize>,
    output_indexes: Vec<usize>,
    sum_args: Vec<BoundExpr>,
    state: MaterializeState,
}

impl GroupSumOperator {
    pub fn new(
        source: Box<dyn Operator>,
        group_refs: &[ColumnRef],
        output_refs: &[ColumnRef],
        sum_args: &[Expr],
        resolver: &dyn ColumnResolver,
    ) -> ExecuteResult<Self> {
        let resolve_all = |refs: &[ColumnRef]| {
            refs.iter()
                .map(|c| resolver.resolve_ref(c))
                .collect::<ExecuteResult<Vec<_>>>()
        };
        let group_indexes = resolve_all(group_refs)?;
        let output_indexes = resolve_all(output_refs)?;
        let sum_args = sum_args
            .iter()
            .map(|e| BoundExpr::bind(e, resolver))
            .collect::<ExecuteResult<Vec<_>>>()?;

        Ok(Self {
            source,
            group_indexes,
            output_indexes,
            sum_args,
            state: MaterializeState::NotMaterialized,
        })
    }

    fn materialize(&mut self) -> ExecuteResult<()> {
        let mut positions: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<AggState> = Vec::new();

        while let Some(tuple) = self.source.next_tuple()? {
            let key = tuple.pick(&self.group_indexes)?.into_values();
            let slot = match positions.get(&key) {
                Some(&slot) => slot,
                None => {
                    groups.push(AggState {
                        keys: tuple.pick(&self.output_indexes)?.into_values(),
                        sums: vec![0; self.sum_args.len()],
                    });
                    positions.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };

            let group = &mut groups[slot];
            for (sum, arg) in group.sums.iter_mut().zip(&self.sum_args) {
                let value = eval_sum_arg(arg, &tuple)?;
                *sum = sum.checked_add(value).ok_or_else(|| {
                    ExecuteError::TypeCoercion(format!("integer overflow summing {}", arg))
                })?;
            }
        }

        if groups.is_empty() && self.group_indexes.is_empty() && self.output_indexes.is_empty() {
            groups.push(AggState {
                keys: Vec::new(),
                sums: vec![0; self.sum_args.len()],
            });
        }

        let rows = groups
            .into_iter()
            .map(|g| {
                g.keys
                    .into_iter()
                    .chain(g.sums.iter().map(i64::to_string))
                    .collect::<Tuple>()
            })
            .collect();
        self.state = MaterializeState::ready(rows);
        Ok(())
    }
}

impl Operator for GroupSumOperator {
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
