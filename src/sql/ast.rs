//! Internal AST types for lightdb SQL.
//!
//! These types are simplified representations of the SELECT statements
//! that the planner understands. Everything the engine cannot execute is
//! either rejected by the parser or carried in an explicit "unsupported"
//! form so the planner can report it.

use std::fmt;

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(Select),
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Vec<FromItem>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderBy>,
}

/// An item in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// SELECT *
    Wildcard,
    /// SELECT t.*
    QualifiedWildcard(String),
    /// Any other expression (column, aggregate call, literal...).
    Expr(Expr),
}

/// An entry of the FROM list.
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    /// A plain base table.
    Table(String),
    /// Anything else: subqueries, explicit joins, aliased tables.
    Unsupported(String),
}

/// ORDER BY clause item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub ascending: bool,
}

/// A possibly qualified column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// Create an unqualified column reference.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// Create a table-qualified column reference.
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Normalized `table.col` or `col` text used as an output reference.
    pub fn normalized(&self) -> String {
        normalize(&self.to_string())
    }

    /// Copy with table and column trimmed and lowercased.
    pub fn lowercased(&self) -> ColumnRef {
        ColumnRef {
            table: self.table.as_deref().map(normalize),
            column: normalize(&self.column),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(ColumnRef),
    /// Literal value.
    Literal(LiteralValue),
    /// Binary operation (e.g., a = b, a AND b, a * b).
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Function call, only meaningful for aggregates.
    Function { name: String, args: Vec<FunctionArg> },
    /// Nested expression in parentheses.
    Nested(Box<Expr>),
}

impl Expr {
    /// Build `left op right`.
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Integer literal shorthand.
    pub fn int(value: i64) -> Self {
        Expr::Literal(LiteralValue::Integer(value))
    }

    /// Column shorthand accepting `t.c` or `c`.
    pub fn col(reference: &str) -> Self {
        match reference.split_once('.') {
            Some((t, c)) => Expr::Column(ColumnRef::qualified(t, c)),
            None => Expr::Column(ColumnRef::new(reference)),
        }
    }

    /// Visit every column reference in the tree, left to right.
    pub fn for_each_column<'a>(&'a self, f: &mut impl FnMut(&'a ColumnRef)) {
        match self {
            Expr::Column(c) => f(c),
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.for_each_column(f);
                right.for_each_column(f);
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    if let FunctionArg::Expr(e) = arg {
                        e.for_each_column(f);
                    }
                }
            }
            Expr::Nested(inner) => inner.for_each_column(f),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{}", c),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Nested(inner) => write!(f, "({})", inner),
        }
    }
}

/// Function call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArg {
    Expr(Expr),
    /// `*`, as in COUNT(*).
    Wildcard,
}

impl fmt::Display for FunctionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionArg::Expr(e) => write!(f, "{}", e),
            FunctionArg::Wildcard => write!(f, "*"),
        }
    }
}

/// Literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    Integer(i64),
    String(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(n) => write!(f, "{}", n),
            LiteralValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Logical
    And,
    Or,
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Check if this is a comparison operator.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }

    /// Check if this is a logical operator.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Trim and lowercase a name or reference.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
