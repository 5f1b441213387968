//! SELECT-list analysis and validation.

use crate::sql::{normalize, ColumnRef, Expr, FunctionArg, SelectItem};

use super::error::{PlanError, PlanResult};

/// Aggregate function names the analyser recognizes.
const AGGREGATE_FUNCTIONS: &[&str] = &["sum", "count"];

/// One aggregate call from the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct AggCall {
    /// Lowercase function name.
    pub name: String,
    /// `None` for `COUNT(*)`.
    pub arg: Option<Expr>,
}

impl AggCall {
    /// Output reference for the aggregate, e.g. `sum(enrolled.mark)`.
    pub fn label(&self) -> String {
        agg_label(&self.name, self.arg.as_ref())
    }
}

pub(crate) fn agg_label(name: &str, arg: Option<&Expr>) -> String {
    match arg {
        Some(e) => normalize(&format!("{}({})", name, e)),
        None => normalize(&format!("{}(*)", name)),
    }
}

/// Classification of a SELECT list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAnalysis {
    /// `SELECT *` or `SELECT t.*` as the only item.
    pub is_star: bool,
    /// Table named by `SELECT t.*`.
    pub star_table: Option<String>,
    /// Non-aggregate SELECT columns in order.
    pub projected_cols: Vec<ColumnRef>,
    pub group_by_cols: Vec<ColumnRef>,
    pub aggregates: Vec<AggCall>,
}

impl QueryAnalysis {
    /// Whether a GroupSum stage is needed.
    pub fn has_aggregation(&self) -> bool {
        !self.aggregates.is_empty() || !self.group_by_cols.is_empty()
    }
}

/// Validates a SELECT list against its GROUP BY clause.
pub struct QueryAnalyser;

impl QueryAnalyser {
    pub fn analyse(items: &[SelectItem], group_by: &[Expr]) -> PlanResult<QueryAnalysis> {
        if items.is_empty() {
            return Err(PlanError::InvalidQuery("SELECT list is empty".into()));
        }

        let group_by_cols = group_by
            .iter()
            .map(|e| match e {
                Expr::Column(c) => Ok(c.lowercased()),
                _ => Err(PlanError::InvalidQuery("GROUP BY only supports columns".into())),
            })
            .collect::<PlanResult<Vec<_>>>()?;

        if let [single] = items {
            let star_table = match single {
                SelectItem::Wildcard => Some(None),
                SelectItem::QualifiedWildcard(t) => Some(Some(normalize(t))),
                SelectItem::Expr(_) => None,
            };
            if let Some(star_table) = star_table {
                if !group_by_cols.is_empty() {
                    return Err(PlanError::InvalidQuery(
                        "SELECT * with GROUP BY is not supported".into(),
                    ));
                }
                return Ok(QueryAnalysis {
                    is_star: true,
                    star_table,
                    ..Default::default()
                });
            }
        }

        let mut projected_cols = Vec::new();
        let mut aggregates = Vec::new();
        for item in items {
            let expr = match item {
                SelectItem::Expr(e) => e,
                SelectItem::Wildcard | SelectItem::QualifiedWildcard(_) => {
                    let message = if items.iter().any(is_aggregate_item) {
                        "SELECT * with aggregates is not supported"
                    } else {
                        "SELECT * must be the only item"
                    };
                    return Err(PlanError::InvalidQuery(message.into()));
                }
            };

            if let Some(agg) = aggregate_call(expr)? {
                aggregates.push(agg);
                continue;
            }

            match expr {
                Expr::Column(c) if aggregates.is_empty() => projected_cols.push(c.lowercased()),
                Expr::Column(_) => {
                    return Err(PlanError::InvalidQuery(
                        "Aggregate functions must appear at end of SELECT list".into(),
                    ))
                }
                _ => {
                    return Err(PlanError::InvalidQuery(
                        "Non-aggregate SELECT items must be columns".into(),
                    ))
                }
            }
        }

        if !group_by_cols.is_empty() {
            if let Some(missing) = projected_cols.iter().find(|c| !group_by_cols.contains(c)) {
                return Err(PlanError::InvalidQuery(format!(
                    "Non-aggregate SELECT column must appear in GROUP BY: {}",
                    missing
                )));
            }
        }

        Ok(QueryAnalysis {
            is_star: false,
            star_table: None,
            projected_cols,
            group_by_cols,
            aggregates,
        })
    }
}

fn is_aggregate_item(item: &SelectItem) -> bool {
    match item {
        SelectItem::Expr(Expr::Function { name, .. }) => AGGREGATE_FUNCTIONS.contains(&normalize(name).as_str()),
        _ => false,
    }
}

/// Recognize `SUM(expr)`, `COUNT(expr)` and `COUNT(*)`.
fn aggregate_call(expr: &Expr) -> PlanResult<Option<AggCall>> {
    let Expr::Function { name, args } = expr else {
        return Ok(None);
    };
    let name = normalize(name);
    if !AGGREGATE_FUNCTIONS.contains(&name.as_str()) {
        return Ok(None);
    }

    let arg = match (name.as_str(), args.as_slice()) {
        ("count", [FunctionArg::Wildcard]) => None,
        (_, [FunctionArg::Expr(e)]) => Some(e.clone()),
        _ => {
            return Err(PlanError::InvalidQuery(format!(
                "{} requires exactly one argument: {}",
                name.to_uppercase(),
                expr
            )))
        }
    };
    Ok(Some(AggCall { name, arg }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{Parser, Statement};

    fn analyse(sql: &str) -> PlanResult<QueryAnalysis> {
        let Statement::Select(select) = Parser::parse(sql).unwrap();
        QueryAnalyser::analyse(&select.items, &select.group_by)
    }

    fn message(sql: &str) -> String {
        analyse(sql).unwrap_err().to_string()
    }

    #[test]
    fn test_star() {
        let a = analyse("SELECT * FROM Student").unwrap();
        assert!(a.is_star);
        assert!(a.star_table.is_none());
        assert!(!a.has_aggregation());

        let a = analyse("SELECT Student.* FROM Student").unwrap();
        assert!(a.is_star);
        assert_eq!(a.star_table.as_deref(), Some("student"));
    }

    #[test]
    fn test_projection_and_aggregates() {
        let a = analyse(
            "SELECT Enrolled.E, SUM(Enrolled.H), COUNT(*) FROM Enrolled GROUP BY Enrolled.E",
        )
        .unwrap();
        assert!(!a.is_star);
        assert_eq!(a.projected_cols, vec![ColumnRef::qualified("enrolled", "e")]);
        assert_eq!(a.group_by_cols, vec![ColumnRef::qualified("enrolled", "e")]);
        assert_eq!(a.aggregates.len(), 2);
        assert_eq!(a.aggregates[0].label(), "sum(enrolled.h)");
        assert_eq!(a.aggregates[1].name, "count");
        assert!(a.aggregates[1].arg.is_none());
        assert_eq!(a.aggregates[1].label(), "count(*)");
        assert!(a.has_aggregation());
    }

    #[test]
    fn test_group_by_without_aggregates() {
        let a = analyse("SELECT a FROM t GROUP BY a").unwrap();
        assert!(a.aggregates.is_empty());
        assert!(a.has_aggregation());
    }

    #[test]
    fn test_rejections() {
        assert!(message("SELECT * FROM t GROUP BY a").contains("SELECT * with GROUP BY"));
        assert!(message("SELECT *, SUM(a) FROM t").contains("SELECT * with aggregates"));
        assert_eq!(message("SELECT *, a FROM t"), "invalid query: SELECT * must be the only item");
        assert_eq!(message("SELECT a, t.* FROM t"), "invalid query: SELECT * must be the only item");
        assert!(message("SELECT a + 1 FROM t").contains("must be columns"));
        assert!(message("SELECT 5 FROM t").contains("must be columns"));
        assert!(message("SELECT SUM(a), b FROM t GROUP BY b").contains("at end of SELECT list"));
        assert!(message("SELECT a FROM t GROUP BY a + 1").contains("GROUP BY only supports columns"));
        assert!(message("SELECT a, b, SUM(c) FROM t GROUP BY a")
            .contains("must appear in GROUP BY: b"));
        assert!(message("SELECT SUM(a, b) FROM t").contains("requires exactly one argument"));
        assert!(message("SELECT SUM(*) FROM t").contains("requires exactly one argument"));
    }

    #[test]
    fn test_group_by_match_is_textual() {
        // A qualified GROUP BY column does not cover a bare SELECT column.
        assert!(analyse("SELECT a FROM t GROUP BY t.a").is_err());
        assert!(analyse("SELECT T.A FROM t GROUP BY t.a").is_ok());
    }

    #[test]
    fn test_columns_are_normalized() {
        let a = analyse("SELECT  Student.SID , Student.Name FROM Student GROUP BY Student.Name, STUDENT.sid").unwrap();
        assert_eq!(
            a.projected_cols,
            vec![ColumnRef::qualified("student", "sid"), ColumnRef::qualified("student", "name")]
        );
        assert_eq!(
            a.group_by_cols,
            vec![ColumnRef::qualified("student", "name"), ColumnRef::qualified("student", "sid")]
        );
    }
}
