//! Staged assembly of a query plan.
//!
//! A SELECT is planned in five steps, each wrapping the previous root:
//! base plan (scans, pushed-down selections, joins, residual filter),
//! aggregation, projection, duplicate elimination and ordering.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::analyser::{agg_label, QueryAnalyser, QueryAnalysis};
use super::error::{PlanError, PlanResult};
use super::logical::{LogicalPlan, OrderKey};
use super::physical::PhysicalPlanner;
use super::where_classifier::{conjoin, WhereClassifier};
use crate::catalog::{Catalog, TableMeta};
use crate::executor::{ExecuteError, MultiTableResolver, Operator};
use crate::sql::{normalize, ColumnRef, Expr, FromItem, FunctionArg, OrderBy, Select};

/// A planned query ready to run.
pub struct QueryPlan {
    pub logical: LogicalPlan,
    /// Normalized reference for every field of the result rows.
    pub output_schema: Vec<String>,
    pub root: Box<dyn Operator>,
}

/// Builds plans for SELECT statements against a catalog.
pub struct PlanBuilder;

impl PlanBuilder {
    /// Plan `select` and instantiate its operator tree.
    pub fn build(select: &Select, catalog: &Catalog) -> PlanResult<QueryPlan> {
        let logical = Self::logical(select, catalog)?;
        let output_schema = logical.output_columns();
        let root = PhysicalPlanner::build(&logical)?;
        Ok(QueryPlan {
            logical,
            output_schema,
            root,
        })
    }

    /// Plan `select` without opening any data file.
    pub fn logical(select: &Select, catalog: &Catalog) -> PlanResult<LogicalPlan> {
        let analysis = QueryAnalyser::analyse(&select.items, &select.group_by)?;
        let tables = Self::from_tables(&select.from, catalog)?;

        let mut plan = Self::base_plan(&tables, select.where_clause.as_ref())?;

        let aggregated = analysis.has_aggregation();
        if aggregated {
            plan = Self::aggregate(plan, &analysis)?;
        }

        if !aggregated {
            if let Some(columns) = Self::projection(&analysis, &tables)? {
                plan = LogicalPlan::Project {
                    input: Box::new(plan),
                    columns,
                };
            }
        }

        if select.distinct {
            plan = LogicalPlan::Distinct {
                input: Box::new(plan),
            };
        }

        if !select.order_by.is_empty() {
            let keys = Self::order_keys(&select.order_by, &plan.output_columns())?;
            plan = LogicalPlan::Sort {
                input: Box::new(plan),
                keys,
            };
        }

        debug!(plan = %plan, "planned query");
        Ok(plan)
    }

    fn from_tables(from: &[FromItem], catalog: &Catalog) -> PlanResult<Vec<Arc<TableMeta>>> {
        if from.is_empty() {
            return Err(PlanError::InvalidQuery("FROM clause is required".into()));
        }
        let mut seen = HashSet::new();
        let mut tables = Vec::with_capacity(from.len());
        for item in from {
            let table = match item {
                FromItem::Table(name) => catalog.get_table(name)?,
                FromItem::Unsupported(text) => {
                    return Err(PlanError::Unsupported(format!("FROM item: {}", text)))
                }
            };
            if !seen.insert(table.name.clone()) {
                return Err(PlanError::InvalidQuery(format!(
                    "table listed more than once in FROM: {}",
                    table.name
                )));
            }
            tables.push(table);
        }
        Ok(tables)
    }

    /// Scans with pushed-down selections, a left-deep join tree in FROM
    /// order and a final filter for whatever no join claimed.
    fn base_plan(tables: &[Arc<TableMeta>], where_clause: Option<&Expr>) -> PlanResult<LogicalPlan> {
        let resolver = MultiTableResolver::for_tables(tables);
        let qualified = where_clause.map(|w| qualify(w, &resolver)).transpose()?;
        let mut classifier = WhereClassifier::new(qualified.as_ref());

        let mut inputs = Vec::with_capacity(tables.len());
        for table in tables {
            let scan = LogicalPlan::Scan {
                table: Arc::clone(table),
            };
            let node = match conjoin(classifier.extract_single_table(&table.name)) {
                Some(predicate) => LogicalPlan::Select {
                    input: Box::new(scan),
                    table: Arc::clone(table),
                    predicate,
                },
                None => scan,
            };
            inputs.push(node);
        }

        let mut inputs = inputs.into_iter();
        let mut plan = inputs
            .next()
            .ok_or_else(|| PlanError::InvalidQuery("FROM clause is required".into()))?;
        let mut left_names = vec![tables[0].name.clone()];
        for (right, table) in inputs.zip(&tables[1..]) {
            let condition = conjoin(classifier.extract_join_predicates(left_names.as_slice(), &table.name));
            plan = LogicalPlan::Join {
                left: Box::new(plan),
                right: Box::new(right),
                condition,
            };
            left_names.push(table.name.clone());
        }

        if let Some(predicate) = conjoin(classifier.remaining()) {
            plan = LogicalPlan::Filter {
                input: Box::new(plan),
                predicate,
            };
        }
        Ok(plan)
    }

    fn aggregate(input: LogicalPlan, analysis: &QueryAnalysis) -> PlanResult<LogicalPlan> {
        let mut sums = Vec::with_capacity(analysis.aggregates.len());
        let mut labels = Vec::with_capacity(analysis.aggregates.len());
        for agg in &analysis.aggregates {
            match (agg.name.as_str(), &agg.arg) {
                ("sum", Some(arg)) => {
                    sums.push(arg.clone());
                    labels.push(agg.label());
                }
                _ => {
                    return Err(PlanError::Unsupported(format!(
                        "aggregate function {}",
                        agg.label()
                    )))
                }
            }
        }

        let group_by = if analysis.group_by_cols.is_empty() {
            analysis.projected_cols.clone()
        } else {
            analysis.group_by_cols.clone()
        };

        Ok(LogicalPlan::GroupSum {
            input: Box::new(input),
            group_by,
            output_keys: analysis.projected_cols.clone(),
            sums,
            labels,
        })
    }

    /// Columns to project, or `None` when the joined tuple is the output.
    fn projection(analysis: &QueryAnalysis, tables: &[Arc<TableMeta>]) -> PlanResult<Option<Vec<ColumnRef>>> {
        if !analysis.is_star {
            return Ok(Some(analysis.projected_cols.clone()));
        }
        let Some(star_table) = &analysis.star_table else {
            return Ok(None);
        };
        if tables.len() == 1 && tables[0].name == *star_table {
            return Ok(None);
        }
        let table = tables
            .iter()
            .find(|t| t.name == *star_table)
            .ok_or_else(|| {
                PlanError::InvalidQuery(format!("{}.* names a table not in FROM", star_table))
            })?;
        Ok(Some(
            table
                .columns
                .iter()
                .map(|c| ColumnRef::qualified(table.name.clone(), c.name.clone()))
                .collect(),
        ))
    }

    /// Resolve ORDER BY items against the current output references.
    fn order_keys(order_by: &[OrderBy], output: &[String]) -> PlanResult<Vec<OrderKey>> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (i, reference) in output.iter().enumerate() {
            positions.entry(reference.as_str()).or_insert(i);
        }
        for (i, reference) in output.iter().enumerate() {
            if let Some((table, column)) = reference.split_once('.') {
                if !table.contains('(') {
                    positions.entry(column).or_insert(i);
                }
            }
        }

        order_by
            .iter()
            .map(|item| {
                let reference = order_reference(&item.expr)?;
                let index = *positions
                    .get(reference.as_str())
                    .ok_or_else(|| PlanError::OrderByNotInOutput(reference.clone()))?;
                Ok(OrderKey {
                    reference,
                    index,
                    ascending: item.ascending,
                })
            })
            .collect()
    }
}

/// Output reference an ORDER BY item refers to.
fn order_reference(expr: &Expr) -> PlanResult<String> {
    match expr {
        Expr::Column(c) => Ok(c.normalized()),
        Expr::Function { name, args } if normalize(name) == "sum" => match args.as_slice() {
            [FunctionArg::Expr(arg)] => Ok(agg_label("sum", Some(arg))),
            _ => Err(PlanError::InvalidQuery(format!("SUM requires exactly one argument: {}", expr))),
        },
        other => Err(PlanError::Unsupported(format!(
            "order by supports only columns and SUM(...), got: {}",
            other
        ))),
    }
}

/// Qualify every column of `expr` with the table that owns it.
fn qualify(expr: &Expr, resolver: &MultiTableResolver) -> Result<Expr, ExecuteError> {
    Ok(match expr {
        Expr::Column(c) => Expr::Column(resolver.qualify(c)?),
        Expr::Literal(_) => expr.clone(),
        Expr::BinaryOp { left, op, right } => Expr::binary(qualify(left, resolver)?, *op, qualify(right, resolver)?),
        Expr::Nested(inner) => Expr::Nested(Box::new(qualify(inner, resolver)?)),
        Expr::Function { name, args } => Expr::Function {
            name: name.clone(),
            args: args
                .iter()
                .map(|a| match a {
                    FunctionArg::Expr(e) => qualify(e, resolver).map(FunctionArg::Expr),
                    FunctionArg::Wildcard => Ok(FunctionArg::Wildcard),
                })
                .collect::<Result<_, _>>()?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::university;
    use crate::executor::operators::rows;
    use crate::sql::{BinaryOperator, Parser, Statement};

    fn select(sql: &str) -> Select {
        let Statement::Select(s) = Parser::parse(sql).unwrap();
        s
    }

    fn explain(catalog: &Catalog, sql: &str) -> String {
        PlanBuilder::logical(&select(sql), catalog).unwrap().to_string()
    }

    #[test]
    fn test_pushdown_and_join_placement() {
        let (_dir, catalog) = university();
        let plan = explain(
            &catalog,
            "SELECT * FROM Student, Enrolled, Course \
             WHERE Student.sid = Enrolled.sid AND Enrolled.cid = Course.cid \
             AND Student.age > 20 AND credits = 4 AND Student.sid < Course.cid",
        );
        assert_eq!(
            plan,
            "Join: ON enrolled.cid = course.cid AND student.sid < course.cid\n\
             \x20 Join: ON student.sid = enrolled.sid\n\
             \x20   Select: student WHERE student.age > 20\n\
             \x20     Scan: student\n\
             \x20   Scan: enrolled\n\
             \x20 Select: course WHERE course.credits = 4\n\
             \x20   Scan: course\n"
        );
    }

    #[test]
    fn test_join_predicate_waits_for_every_table() {
        let (_dir, catalog) = university();
        let mut plan = PlanBuilder::build(
            &select("SELECT * FROM Student, Enrolled, Course WHERE Student.sid = Enrolled.sid OR Course.cid = 103"),
            &catalog,
        )
        .unwrap();
        assert_eq!(
            plan.logical.to_string(),
            "Join: ON student.sid = enrolled.sid OR course.cid = 103\n\
             \x20 Join\n\
             \x20   Scan: student\n\
             \x20   Scan: enrolled\n\
             \x20 Scan: course\n"
        );
        // 5 matching pairs with every course, plus the 15 other pairs with course 103.
        assert_eq!(rows(plan.root.as_mut()).len(), 30);
    }

    #[test]
    fn test_pushed_down_selection_matches_filter_after_join() {
        let (_dir, catalog) = university();
        let student = catalog.get_table("student").unwrap();
        let enrolled = catalog.get_table("enrolled").unwrap();
        let predicate = Expr::binary(
            Expr::binary(Expr::col("student.age"), BinaryOperator::Gt, Expr::int(20)),
            BinaryOperator::And,
            Expr::binary(Expr::int(1), BinaryOperator::Eq, Expr::int(1)),
        );

        let pushed = LogicalPlan::Join {
            left: Box::new(LogicalPlan::Select {
                input: Box::new(LogicalPlan::Scan {
                    table: Arc::clone(&student),
                }),
                table: Arc::clone(&student),
                predicate: predicate.clone(),
            }),
            right: Box::new(LogicalPlan::Scan {
                table: Arc::clone(&enrolled),
            }),
            condition: None,
        };
        let filtered = LogicalPlan::Filter {
            input: Box::new(LogicalPlan::Join {
                left: Box::new(LogicalPlan::Scan { table: student }),
                right: Box::new(LogicalPlan::Scan { table: enrolled }),
                condition: None,
            }),
            predicate,
        };

        let mut a = rows(PhysicalPlanner::build(&pushed).unwrap().as_mut());
        let mut b = rows(PhysicalPlanner::build(&filtered).unwrap().as_mut());
        a.sort();
        b.sort();
        assert_eq!(a.len(), 15);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cross_product_without_where() {
        let (_dir, catalog) = university();
        let plan = explain(&catalog, "SELECT Student.sid, Course.cid FROM Student, Course");
        assert_eq!(
            plan,
            "Project: [student.sid, course.cid]\n  Join\n    Scan: student\n    Scan: course\n"
        );
    }

    #[test]
    fn test_aggregate_plan_and_schema() {
        let (_dir, catalog) = university();
        let plan = PlanBuilder::build(
            &select("SELECT Enrolled.sid, SUM(Enrolled.mark) FROM Enrolled GROUP BY Enrolled.sid ORDER BY SUM(Enrolled.mark) DESC"),
            &catalog,
        )
        .unwrap();
        assert_eq!(plan.output_schema, vec!["enrolled.sid", "sum(enrolled.mark)"]);
        assert!(plan.logical.to_string().starts_with("Sort: [sum(enrolled.mark)#1 DESC]\n  GroupSum"));
    }

    #[test]
    fn test_star_output_schema() {
        let (_dir, catalog) = university();
        let plan = PlanBuilder::build(&select("SELECT * FROM Course"), &catalog).unwrap();
        assert_eq!(plan.output_schema, vec!["course.cid", "course.title", "course.credits"]);
    }

    #[test]
    fn test_qualified_star_in_join_projects_one_table() {
        let (_dir, catalog) = university();
        let mut plan = PlanBuilder::build(
            &select("SELECT Course.* FROM Enrolled, Course WHERE Enrolled.cid = Course.cid AND Enrolled.sid = 1"),
            &catalog,
        )
        .unwrap();
        assert_eq!(plan.output_schema, vec!["course.cid", "course.title", "course.credits"]);
        assert_eq!(rows(plan.root.as_mut()), vec!["101, db, 4", "102, os, 3"]);
    }

    #[test]
    fn test_order_by_bare_alias_of_qualified_output() {
        let (_dir, catalog) = university();
        let plan = explain(&catalog, "SELECT Student.sid, Student.age FROM Student ORDER BY age");
        assert!(plan.starts_with("Sort: [age#1 ASC]"));
    }

    #[test]
    fn test_order_by_must_be_in_output() {
        let (_dir, catalog) = university();
        let err = PlanBuilder::logical(&select("SELECT sid FROM Student ORDER BY age"), &catalog).unwrap_err();
        assert!(matches!(err, PlanError::OrderByNotInOutput(ref c) if c == "age"));
        assert!(err.to_string().contains("order by"));
    }

    #[test]
    fn test_where_resolution_errors_surface_at_plan_time() {
        let (_dir, catalog) = university();
        let err = PlanBuilder::logical(&select("SELECT * FROM Student, Enrolled WHERE sid = 1"), &catalog)
            .unwrap_err();
        assert!(matches!(err, PlanError::Execute(ExecuteError::AmbiguousColumn(_))));

        let err = PlanBuilder::logical(&select("SELECT * FROM Student WHERE nope = 1"), &catalog).unwrap_err();
        assert!(matches!(err, PlanError::Execute(ExecuteError::UnknownColumn(_))));
    }

    #[test]
    fn test_projection_resolution_errors_surface_at_build() {
        let (_dir, catalog) = university();
        let err = PlanBuilder::build(&select("SELECT sid FROM Student, Enrolled"), &catalog)
            .err()
            .unwrap();
        assert!(matches!(err, PlanError::Execute(ExecuteError::AmbiguousColumn(_))));
    }

    #[test]
    fn test_rejections() {
        let (_dir, catalog) = university();
        let plan = |sql: &str| PlanBuilder::logical(&select(sql), &catalog);

        assert!(matches!(plan("SELECT * FROM Nope"), Err(PlanError::Catalog(_))));
        assert!(matches!(plan("SELECT COUNT(*) FROM Student"), Err(PlanError::Unsupported(_))));
        assert!(matches!(plan("SELECT * FROM Student, Student"), Err(PlanError::InvalidQuery(_))));
        assert!(matches!(plan("SELECT * FROM Student s"), Err(PlanError::Unsupported(_))));
        assert!(matches!(plan("SELECT Course.* FROM Student"), Err(PlanError::InvalidQuery(_))));
        assert!(matches!(
            plan("SELECT sid FROM Student ORDER BY sid + 1"),
            Err(PlanError::Unsupported(_))
        ));
    }
}
