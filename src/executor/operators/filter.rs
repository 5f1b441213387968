//! Selection operator.
//!
//! The same operator serves as the per-table selection pushed down above a
//! scan and as the final filter above a join tree; only the resolver used
//! to bind the predicate differs.

use super::Operator;
use crate::executor::error::ExecuteResult;
use crate::executor::eval::{eval_predicate, BoundExpr};
use crate::executor::resolver::ColumnResolver;
use crate::executor::tuple::Tuple;
use crate::sql::Expr;

/// Passes through the child tuples that satisfy a predicate.
pub struct FilterOperator {
    source: Box<dyn Operator>,
    predicate: Option<BoundExpr>,
}

impl FilterOperator {
    pub fn new(
        source: Box<dyn Operator>,
        predicate: Option<&Expr>,
        resolver: &dyn ColumnResolver,
    ) -> ExecuteResult<Self> {
        let predicate = predicate.map(|p| BoundExpr::bind(p, resolver)).transpose()?;
        Ok(Self { source, predicate })
    }
}

impl Operator for FilterOperator {
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>> {
        while let Some(tuple) = self.source.next_tuple()? {
            if eval_predicate(self.predicate.as_ref(), &tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) -> ExecuteResult<()> {
        self.source.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::operators::{rows, VecSource};
    use crate::executor::resolver::SingleTableResolver;
    use crate::executor::ExecuteError;
    use crate::sql::BinaryOperator;

    fn resolver() -> SingleTableResolver {
        SingleTableResolver::new("t", &["a", "b"])
    }

    #[test]
    fn test_filter_keeps_matching_in_order() {
        let source = VecSource::boxed(&[&["1", "9"], &["6", "2"], &["7", "7"], &["3", "0"]]);
        let pred = Expr::binary(Expr::col("t.a"), BinaryOperator::Gt, Expr::int(5));
        let mut op = FilterOperator::new(source, Some(&pred), &resolver()).unwrap();
        assert_eq!(rows(&mut op), vec!["6, 2", "7, 7"]);
    }

    #[test]
    fn test_no_predicate_passes_everything() {
        let source = VecSource::boxed(&[&["1", "9"], &["6", "2"]]);
        let mut op = FilterOperator::new(source, None, &resolver()).unwrap();
        assert_eq!(rows(&mut op), vec!["1, 9", "6, 2"]);
    }

    #[test]
    fn test_reset_replays() {
        let source = VecSource::boxed(&[&["1", "1"], &["2", "2"]]);
        let pred = Expr::binary(Expr::col("a"), BinaryOperator::Eq, Expr::col("b"));
        let mut op = FilterOperator::new(source, Some(&pred), &resolver()).unwrap();
        let first = rows(&mut op);
        op.reset().unwrap();
        assert_eq!(rows(&mut op), first);
    }

    #[test]
    fn test_unknown_column_fails_at_construction() {
        let source = VecSource::boxed(&[]);
        let pred = Expr::binary(Expr::col("t.zz"), BinaryOperator::Gt, Expr::int(5));
        let err = FilterOperator::new(source, Some(&pred), &resolver()).err().unwrap();
        assert!(matches!(err, ExecuteError::UnknownColumn(_)));
    }
}
