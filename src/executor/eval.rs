//! Expression evaluation.
//!
//! Expressions are bound once, when an operator is built: every column
//! reference is replaced by its tuple offset. Evaluation then walks the
//! bound tree recursively. Two entry points exist, one producing a boolean
//! for predicates and one producing an integer for SUM arguments.
//!
//! All stored values are text. Wherever a number is needed the field is
//! parsed as an `i64`, and a field that does not parse is a hard error.

use std::fmt;

use super::error::{ExecuteError, ExecuteResult};
use super::resolver::ColumnResolver;
use super::tuple::Tuple;
use crate::sql::{BinaryOperator, Expr, LiteralValue};

/// An expression whose column references have been resolved to offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Literal(LiteralValue),
    Column { index: usize, name: String },
    BinaryOp {
        left: Box<BoundExpr>,
        op: BinaryOperator,
        right: Box<BoundExpr>,
    },
    Nested(Box<BoundExpr>),
    /// Function calls are kept only so evaluation can report them.
    Function(String),
}

impl BoundExpr {
    /// Resolve every column of `expr` against `resolver`.
    pub fn bind(expr: &Expr, resolver: &dyn ColumnResolver) -> ExecuteResult<Self> {
        Ok(match expr {
            Expr::Literal(v) => BoundExpr::Literal(v.clone()),
            Expr::Column(c) => BoundExpr::Column {
                index: resolver.resolve_ref(c)?,
                name: c.normalized(),
            },
            Expr::BinaryOp { left, op, right } => BoundExpr::BinaryOp {
                left: Box::new(Self::bind(left, resolver)?),
                op: *op,
                right: Box::new(Self::bind(right, resolver)?),
            },
            Expr::Nested(inner) => BoundExpr::Nested(Box::new(Self::bind(inner, resolver)?)),
            Expr::Function { .. } => BoundExpr::Function(expr.to_string()),
        })
    }
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpr::Literal(v) => write!(f, "{}", v),
            BoundExpr::Column { name, .. } => write!(f, "{}", name),
            BoundExpr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            BoundExpr::Nested(inner) => write!(f, "({})", inner),
            BoundExpr::Function(text) => write!(f, "{}", text),
        }
    }
}

/// Parse a field as a signed integer.
pub fn parse_int(value: &str) -> ExecuteResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ExecuteError::TypeCoercion(format!("'{}' is not an integer", value)))
}

fn literal_int(v: &LiteralValue) -> ExecuteResult<i64> {
    match v {
        LiteralValue::Integer(n) => Ok(*n),
        LiteralValue::String(s) => parse_int(s),
    }
}

/// Evaluate a predicate against a tuple. A missing predicate accepts everything.
///
/// AND and OR always evaluate both operands.
pub fn eval_predicate(predicate: Option<&BoundExpr>, tuple: &Tuple) -> ExecuteResult<bool> {
    match predicate {
        None => Ok(true),
        Some(p) => eval_bool(p, tuple),
    }
}

fn eval_bool(expr: &BoundExpr, tuple: &Tuple) -> ExecuteResult<bool> {
    match expr {
        BoundExpr::Nested(inner) => eval_bool(inner, tuple),
        BoundExpr::BinaryOp { left, op, right } if op.is_logical() => {
            let l = eval_bool(left, tuple)?;
            let r = eval_bool(right, tuple)?;
            Ok(match op {
                BinaryOperator::And => l && r,
                _ => l || r,
            })
        }
        BoundExpr::BinaryOp { left, op, right } if op.is_comparison() => {
            let l = eval_operand(left, tuple)?;
            let r = eval_operand(right, tuple)?;
            Ok(compare(*op, l, r))
        }
        other => Err(ExecuteError::MalformedExpression(format!(
            "expected a boolean condition, got: {}",
            other
        ))),
    }
}

fn eval_operand(expr: &BoundExpr, tuple: &Tuple) -> ExecuteResult<i64> {
    match expr {
        BoundExpr::Literal(v) => literal_int(v),
        BoundExpr::Column { index, .. } => parse_int(tuple.get(*index)?),
        BoundExpr::Nested(inner) => eval_operand(inner, tuple),
        other => Err(ExecuteError::MalformedExpression(format!(
            "expected an integer operand, got: {}",
            other
        ))),
    }
}

fn compare(op: BinaryOperator, l: i64, r: i64) -> bool {
    match op {
        BinaryOperator::Eq => l == r,
        BinaryOperator::NotEq => l != r,
        BinaryOperator::Lt => l < r,
        BinaryOperator::LtEq => l <= r,
        BinaryOperator::Gt => l > r,
        BinaryOperator::GtEq => l >= r,
        _ => false,
    }
}

/// Evaluate a SUM argument against a tuple.
///
/// Supports integer literals, columns, parentheses and multiplication.
pub fn eval_sum_arg(expr: &BoundExpr, tuple: &Tuple) -> ExecuteResult<i64> {
    match expr {
        BoundExpr::Literal(v) => literal_int(v),
        BoundExpr::Column { index, .. } => parse_int(tuple.get(*index)?),
        BoundExpr::Nested(inner) => eval_sum_arg(inner, tuple),
        BoundExpr::BinaryOp {
            left,
            op: BinaryOperator::Multiply,
            right,
        } => {
            let l = eval_sum_arg(left, tuple)?;
            let r = eval_sum_arg(right, tuple)?;
            l.checked_mul(r).ok_or_else(|| {
                ExecuteError::TypeCoercion(format!("integer overflow in {} * {}", l, r))
            })
        }
        other => Err(ExecuteError::UnsupportedExpression(format!(
            "unsupported SUM argument: {}",
            other
        ))),
    }
}
