//! Turns a logical plan into a tree of executable operators.
//!
//! Column references are bound here, so unknown or ambiguous columns are
//! reported before the first tuple is pulled.

use tracing::trace;

use super::error::PlanResult;
use super::logical::LogicalPlan;
use crate::executor::{
    DistinctOperator, FilterOperator, GroupSumOperator, JoinOperator, MultiTableResolver, Operator,
    ProjectOperator, ScanOperator, SingleTableResolver, SortKey, SortOperator,
};

/// Instantiates operators for a [`LogicalPlan`].
pub struct PhysicalPlanner;

impl PhysicalPlanner {
    pub fn build(plan: &LogicalPlan) -> PlanResult<Box<dyn Operator>> {
        let op: Box<dyn Operator> = match plan {
            LogicalPlan::Scan { table } => Box::new(ScanOperator::new(table.clone())?),

            LogicalPlan::Select {
                input,
                table,
                predicate,
            } => {
                let resolver = SingleTableResolver::for_table(table);
                Box::new(FilterOperator::new(Self::build(input)?, Some(predicate), &resolver)?)
            }

            LogicalPlan::Join {
                left,
                right,
                condition,
            } => {
                let resolver = MultiTableResolver::for_tables(&plan.tables());
                let (l, r) = (Self::build(left)?, Self::build(right)?);
                Box::new(JoinOperator::new(l, r, condition.as_ref(), &resolver)?)
            }

            LogicalPlan::Filter { input, predicate } => {
                let resolver = MultiTableResolver::for_tables(&input.tables());
                Box::new(FilterOperator::new(Self::build(input)?, Some(predicate), &resolver)?)
            }

            LogicalPlan::GroupSum {
                input,
                group_by,
                output_keys,
                sums,
                ..
            } => {
                let resolver = MultiTableResolver::for_tables(&input.tables());
                Box::new(GroupSumOperator::new(
                    Self::build(input)?,
                    group_by,
                    output_keys,
                    sums,
                    &resolver,
                )?)
            }

            LogicalPlan::Project { input, columns } => {
                let resolver = MultiTableResolver::for_tables(&input.tables());
                Box::new(ProjectOperator::new(Self::build(input)?, columns, &resolver)?)
            }

            LogicalPlan::Distinct { input } => Box::new(DistinctOperator::new(Self::build(input)?)),

            LogicalPlan::Sort { input, keys } => {
                let keys = keys
                    .iter()
                    .map(|k| SortKey {
                        index: k.index,
                        ascending: k.ascending,
                    })
                    .collect();
                Box::new(SortOperator::new(Self::build(input)?, keys))
            }
        };
        trace!(node = node_name(plan), "built operator");
        Ok(op)
    }
}

fn node_name(plan: &LogicalPlan) -> &'static str {
    match plan {
        LogicalPlan::Scan { .. } => "scan",
        LogicalPlan::Select { .. } => "select",
        LogicalPlan::Join { .. } => "join",
        LogicalPlan::Filter { .. } => "filter",
        LogicalPlan::GroupSum { .. } => "group_sum",
        LogicalPlan::Project { .. } => "project",
        LogicalPlan::Distinct { .. } => "distinct",
        LogicalPlan::Sort { .. } => "sort",
    }
}
