//! SQL parser implementation.
//!
//! Converts SQL strings to our internal AST using sqlparser.

use std::path::Path;

use sqlparser::ast as sp;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;

use super::ast::*;
use super::error::{ParseError, ParseResult};

/// SQL parser for lightdb.
pub struct Parser;

impl Parser {
    /// Parse a SQL string into a statement.
    pub fn parse(sql: &str) -> ParseResult<Statement> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(ParseError::EmptyQuery);
        }

        let dialect = GenericDialect {};
        let statements = SqlParser::parse_sql(&dialect, sql)?;

        if statements.is_empty() {
            return Err(ParseError::EmptyQuery);
        }
        if statements.len() > 1 {
            return Err(ParseError::MultipleStatements);
        }

        Self::convert_statement(&statements[0])
    }

    /// Read a query file and parse the single statement it holds.
    pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<Statement> {
        let path = path.as_ref();
        let sql = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&sql)
    }

    fn convert_statement(stmt: &sp::Statement) -> ParseResult<Statement> {
        match stmt {
            sp::Statement::Query(query) => Self::convert_query(query),
            other => Err(ParseError::UnsupportedStatement(format!(
                "only SELECT is supported, got: {}",
                other
            ))),
        }
    }

    fn convert_query(query: &sp::Query) -> ParseResult<Statement> {
        let select = match query.body.as_ref() {
            sp::SetExpr::Select(s) => s,
            other => {
                return Err(ParseError::UnsupportedStatement(format!(
                    "only simple SELECT queries are supported, got: {}",
                    other
                )))
            }
        };

        if query.with.is_some() {
            return Err(ParseError::UnsupportedStatement("WITH clause".into()));
        }
        if query.limit.is_some() || query.offset.is_some() {
            return Err(ParseError::UnsupportedStatement("LIMIT/OFFSET".into()));
        }
        if select.having.is_some() {
            return Err(ParseError::UnsupportedStatement("HAVING clause".into()));
        }

        let distinct = match &select.distinct {
            None => false,
            Some(sp::Distinct::Distinct) => true,
            Some(sp::Distinct::On(_)) => {
                return Err(ParseError::UnsupportedStatement("DISTINCT ON".into()))
            }
        };

        // FROM clause
        let from = select.from.iter()
            .map(Self::convert_from_item)
            .collect::<ParseResult<Vec<_>>>()?;

        // SELECT list
        let items = select.projection.iter()
            .map(Self::convert_select_item)
            .collect::<ParseResult<Vec<_>>>()?;

        // WHERE clause
        let where_clause = select.selection
            .as_ref()
            .map(Self::convert_expr)
            .transpose()?;

        // GROUP BY
        let group_by = match &select.group_by {
            sp::GroupByExpr::Expressions(exprs, _) => exprs.iter()
                .map(Self::convert_expr)
                .collect::<ParseResult<Vec<_>>>()?,
            sp::GroupByExpr::All(_) => {
                return Err(ParseError::UnsupportedStatement("GROUP BY ALL".into()))
            }
        };

        // ORDER BY
        let order_by = query.order_by
            .as_ref()
            .map(Self::extract_order_by_exprs)
            .transpose()?
            .unwrap_or_default();

        Ok(Statement::Select(Select {
            distinct,
            items,
            from,
            where_clause,
            group_by,
            order_by,
        }))
    }

    fn convert_from_item(from: &sp::TableWithJoins) -> ParseResult<FromItem> {
        if !from.joins.is_empty() {
            return Ok(FromItem::Unsupported(format!(
                "explicit JOIN syntax: {}",
                from
            )));
        }
        match &from.relation {
            sp::TableFactor::Table { name, alias: None, .. } => {
                Ok(FromItem::Table(Self::extract_table_name(name)?))
            }
            other => Ok(FromItem::Unsupported(other.to_string())),
        }
    }

    fn convert_select_item(item: &sp::SelectItem) -> ParseResult<SelectItem> {
        match item {
            sp::SelectItem::Wildcard(_) => Ok(SelectItem::Wildcard),
            sp::SelectItem::QualifiedWildcard(kind, _) => {
                let text = kind.to_string();
                let table = text.trim_end_matches(".*").to_string();
                Ok(SelectItem::QualifiedWildcard(table))
            }
            sp::SelectItem::UnnamedExpr(expr) => Ok(SelectItem::Expr(Self::convert_expr(expr)?)),
            sp::SelectItem::ExprWithAlias { alias, .. } => Err(ParseError::UnsupportedExpression(
                format!("column alias '{}'", alias.value),
            )),
        }
    }

    fn extract_order_by_exprs(ob: &sp::OrderBy) -> ParseResult<Vec<OrderBy>> {
        match &ob.kind {
            sp::OrderByKind::All(_) => Err(ParseError::UnsupportedStatement("ORDER BY ALL".into())),
            sp::OrderByKind::Expressions(exprs) => exprs.iter()
                .map(|e| {
                    Ok(OrderBy {
                        expr: Self::convert_expr(&e.expr)?,
                        ascending: e.options.asc.unwrap_or(true),
                    })
                })
                .collect(),
        }
    }

    fn convert_expr(expr: &sp::Expr) -> ParseResult<Expr> {
        match expr {
            sp::Expr::Identifier(id) => Ok(Expr::Column(ColumnRef::new(id.value.clone()))),

            sp::Expr::CompoundIdentifier(parts) => match parts.as_slice() {
                [table, column] => Ok(Expr::Column(ColumnRef::qualified(
                    table.value.clone(),
                    column.value.clone(),
                ))),
                _ => Err(ParseError::InvalidIdentifier(
                    parts.iter().map(|p| p.value.as_str()).collect::<Vec<_>>().join("."),
                )),
            },

            sp::Expr::Value(v) => Ok(Expr::Literal(Self::convert_value(v)?)),

            sp::Expr::BinaryOp { left, op, right } => {
                let l = Self::convert_expr(left)?;
                let r = Self::convert_expr(right)?;
                let o = Self::convert_binary_op(op)?;
                Ok(Expr::binary(l, o, r))
            }

            // Negative numeric literals arrive as unary minus.
            sp::Expr::UnaryOp { op: sp::UnaryOperator::Minus, expr: inner } => {
                match Self::convert_expr(inner)? {
                    Expr::Literal(LiteralValue::Integer(n)) => {
                        Ok(Expr::Literal(LiteralValue::Integer(-n)))
                    }
                    _ => Err(ParseError::UnsupportedExpression(expr.to_string())),
                }
            }

            sp::Expr::Function(f) => {
                let name = f.name.to_string();
                let args = match &f.args {
                    sp::FunctionArguments::List(list) => list.args.iter()
                        .map(|arg| match arg {
                            sp::FunctionArg::Unnamed(sp::FunctionArgExpr::Expr(e)) => {
                                Ok(FunctionArg::Expr(Self::convert_expr(e)?))
                            }
                            sp::FunctionArg::Unnamed(sp::FunctionArgExpr::Wildcard) => {
                                Ok(FunctionArg::Wildcard)
                            }
                            other => Err(ParseError::UnsupportedExpression(format!(
                                "function argument: {}",
                                other
                            ))),
                        })
                        .collect::<ParseResult<Vec<_>>>()?,
                    sp::FunctionArguments::None => vec![],
                    other => {
                        return Err(ParseError::UnsupportedExpression(format!(
                            "function arguments: {}",
                            other
                        )))
                    }
                };
                Ok(Expr::Function { name, args })
            }

            sp::Expr::Nested(inner) => {
                let e = Self::convert_expr(inner)?;
                Ok(Expr::Nested(Box::new(e)))
            }

            other => Err(ParseError::UnsupportedExpression(other.to_string())),
        }
    }

    fn convert_value(v: &sp::ValueWithSpan) -> ParseResult<LiteralValue> {
        match &v.value {
            sp::Value::Number(s, _) => s.parse::<i64>()
                .map(LiteralValue::Integer)
                .map_err(|_| ParseError::UnsupportedExpression(format!("non-integer number: {}", s))),
            sp::Value::SingleQuotedString(s) => Ok(LiteralValue::String(s.clone())),
            other => Err(ParseError::UnsupportedExpression(format!("unsupported value: {}", other))),
        }
    }

    fn convert_binary_op(op: &sp::BinaryOperator) -> ParseResult<BinaryOperator> {
        match op {
            sp::BinaryOperator::Eq => Ok(BinaryOperator::Eq),
            sp::BinaryOperator::NotEq => Ok(BinaryOperator::NotEq),
            sp::BinaryOperator::Lt => Ok(BinaryOperator::Lt),
            sp::BinaryOperator::LtEq => Ok(BinaryOperator::LtEq),
            sp::BinaryOperator::Gt => Ok(BinaryOperator::Gt),
            sp::BinaryOperator::GtEq => Ok(BinaryOperator::GtEq),
            sp::BinaryOperator::And => Ok(BinaryOperator::And),
            sp::BinaryOperator::Or => Ok(BinaryOperator::Or),
            sp::BinaryOperator::Plus => Ok(BinaryOperator::Plus),
            sp::BinaryOperator::Minus => Ok(BinaryOperator::Minus),
            sp::BinaryOperator::Multiply => Ok(BinaryOperator::Multiply),
            sp::BinaryOperator::Divide => Ok(BinaryOperator::Divide),
            other => Err(ParseError::UnsupportedExpression(format!(
                "unsupported operator: {}",
                other
            ))),
        }
    }

    fn extract_table_name(name: &sp::ObjectName) -> ParseResult<String> {
        // Use just the table name, ignoring schema
        name.0.last()
            .map(|i| i.as_ident().map(|id| id.value.clone()).unwrap_or_else(|| i.to_string()))
            .ok_or_else(|| ParseError::InvalidIdentifier("empty table name".into()))
    }
}
