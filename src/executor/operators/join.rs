//! Nested-loop inner join.

use super::Operator;
use crate::executor::error::ExecuteResult;
use crate::executor::eval::{eval_predicate, BoundExpr};
use crate::executor::resolver::ColumnResolver;
use crate::executor::tuple::Tuple;
use crate::sql::Expr;

/// Tuple-at-a-time nested-loop join.
///
/// For every left tuple the right child is reset and scanned in full; each
/// concatenated `left ++ right` tuple that satisfies the condition is emitted.
pub struct JoinOperator {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    condition: Option<BoundExpr>,
    current_left: Option<Tuple>,
}

impl JoinOperator {
    /// `resolver` must describe the concatenated left-then-right schema.
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        condition: Option<&Expr>,
        resolver: &dyn ColumnResolver,
    ) -> ExecuteResult<Self> {
        let condition = condition.map(|c| BoundExpr::bind(c, resolver)).transpose()?;
        Ok(Self {
            left,
            right,
            condition,
            current_left: None,
        })
    }
}

impl Operator for JoinOperator {
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>> {
        loop {
            let left = match self.current_left.take() {
                Some(t) => t,
                None => match self.left.next_tuple()? {
                    Some(t) => {
                        self.right.reset()?;
                        t
                    }
                    None => return Ok(None),
                },
            };

            // Right side exhausted: drop `left` and advance.
            if let Some(right) = self.right.next_tuple()? {
                let joined = left.concat(&right);
                self.current_left = Some(left);
                if eval_predicate(self.condition.as_ref(), &joined)? {
                    return Ok(Some(joined));
                }
            }
        }
    }

    fn reset(&mut self) -> ExecuteResult<()> {
        self.left.reset()?;
        self.right.reset()?;
        self.current_left = None;
        Ok(())
    }
}
