//! Query execution engine.
//!
//! Uses the Volcano/Iterator model where each operator produces
//! tuples one at a time.

mod error;
mod eval;
mod executor;
pub mod operators;
mod resolver;
mod result;
mod tuple;

pub use error::{ExecuteError, ExecuteResult};
pub use eval::{eval_predicate, eval_sum_arg, parse_int, BoundExpr};
pub use executor::QueryExecutor;
pub use operators::{
    DistinctOperator, FilterOperator, GroupSumOperator, JoinOperator, Operator, ProjectOperator,
    ScanOperator, SortKey, SortOperator,
};
pub use resolver::{ColumnResolver, MultiTableResolver, SingleTableResolver};
pub use result::ResultSet;
pub use tuple::{Tuple, FIELD_DELIMITER, OUTPUT_DELIMITER};
