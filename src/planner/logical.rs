//! Logical query plan representation.
//!
//! Logical plans represent *what* the query does, not *how* it will be executed.
//! Every node knows its output references, which is what ORDER BY resolution
//! and result labelling work from.

use std::fmt;
use std::sync::Arc;

use crate::catalog::TableMeta;
use crate::sql::{ColumnRef, Expr};

/// One resolved ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    /// Output reference the key was matched against.
    pub reference: String,
    /// Offset of that reference in the input tuples.
    pub index: usize,
    pub ascending: bool,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{}#{} {}", self.reference, self.index, dir)
    }
}

/// Logical query plan.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// Read every row of a table.
    Scan { table: Arc<TableMeta> },

    /// Single-table predicate pushed down directly above a scan.
    Select {
        input: Box<LogicalPlan>,
        table: Arc<TableMeta>,
        predicate: Expr,
    },

    /// Nested-loop inner join; `None` is a cross product.
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        condition: Option<Expr>,
    },

    /// Predicate over the whole join tree.
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },

    GroupSum {
        input: Box<LogicalPlan>,
        group_by: Vec<ColumnRef>,
        output_keys: Vec<ColumnRef>,
        sums: Vec<Expr>,
        labels: Vec<String>,
    },

    Project {
        input: Box<LogicalPlan>,
        columns: Vec<ColumnRef>,
    },

    Distinct { input: Box<LogicalPlan> },

    Sort {
        input: Box<LogicalPlan>,
        keys: Vec<OrderKey>,
    },
}

impl LogicalPlan {
    /// Normalized references naming each field of this node's output.
    pub fn output_columns(&self) -> Vec<String> {
        match self {
            LogicalPlan::Scan { table } => table
                .columns
                .iter()
                .map(|c| format!("{}.{}", table.name, c.name))
                .collect(),
            LogicalPlan::Select { input, .. }
            | LogicalPlan::Filter { input, .. }
            | LogicalPlan::Distinct { input }
            | LogicalPlan::Sort { input, .. } => input.output_columns(),
            LogicalPlan::Join { left, right, .. } => {
                let mut cols = left.output_columns();
                cols.extend(right.output_columns());
                cols
            }
            LogicalPlan::GroupSum {
                output_keys, labels, ..
            } => output_keys
                .iter()
                .map(ColumnRef::normalized)
                .chain(labels.iter().cloned())
                .collect(),
            LogicalPlan::Project { columns, .. } => columns.iter().map(ColumnRef::normalized).collect(),
        }
    }

    /// Scanned tables in the order their fields appear in joined tuples.
    pub fn tables(&self) -> Vec<Arc<TableMeta>> {
        let mut tables = Vec::new();
        self.collect_tables(&mut tables);
        tables
    }

    fn collect_tables(&self, tables: &mut Vec<Arc<TableMeta>>) {
        match self {
            LogicalPlan::Scan { table } => tables.push(Arc::clone(table)),
            LogicalPlan::Join { left, right, .. } => {
                left.collect_tables(tables);
                right.collect_tables(tables);
            }
            LogicalPlan::Select { input, .. }
            | LogicalPlan::Filter { input, .. }
            | LogicalPlan::GroupSum { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::Distinct { input }
            | LogicalPlan::Sort { input, .. } => input.collect_tables(tables),
        }
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format_indent(f, 0)
    }
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

impl LogicalPlan {
    fn format_indent(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            LogicalPlan::Scan { table } => writeln!(f, "{}Scan: {}", pad, table.name),
            LogicalPlan::Select { input, table, predicate } => {
                writeln!(f, "{}Select: {} WHERE {}", pad, table.name, predicate)?;
                input.format_indent(f, indent + 1)
            }
            LogicalPlan::Join { left, right, condition } => {
                write!(f, "{}Join", pad)?;
                if let Some(cond) = condition {
                    write!(f, ": ON {}", cond)?;
                }
                writeln!(f)?;
                left.format_indent(f, indent + 1)?;
                right.format_indent(f, indent + 1)
            }
            LogicalPlan::Filter { input, predicate } => {
                writeln!(f, "{}Filter: {}", pad, predicate)?;
                input.format_indent(f, indent + 1)
            }
            LogicalPlan::GroupSum {
                input,
                group_by,
                labels,
                ..
            } => {
                writeln!(
                    f,
                    "{}GroupSum: group=[{}], sums=[{}]",
                    pad,
                    join_display(group_by),
                    labels.join(", ")
                )?;
                input.format_indent(f, indent + 1)
            }
            LogicalPlan::Project { input, columns } => {
                writeln!(f, "{}Project: [{}]", pad, join_display(columns))?;
                input.format_indent(f, indent + 1)
            }
            LogicalPlan::Distinct { input } => {
                writeln!(f, "{}Distinct", pad)?;
                input.format_indent(f, indent + 1)
            }
            LogicalPlan::Sort { input, keys } => {
                writeln!(f, "{}Sort: [{}]", pad, join_display(keys))?;
                input.format_indent(f, indent + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType};
    use crate::sql::BinaryOperator;

    fn table(id: u64, name: &str, cols: &[&str]) -> Arc<TableMeta> {
        let cols = cols.iter().map(|c| ColumnMeta::new(c, DataType::Integer)).collect();
        Arc::new(TableMeta::new(id, name, cols, format!("{}.csv", name)))
    }

    fn scan(t: &Arc<TableMeta>) -> Box<LogicalPlan> {
        Box::new(LogicalPlan::Scan { table: Arc::clone(t) })
    }

    #[test]
    fn test_join_output_columns_and_tables() {
        let s = table(1, "Student", &["sid", "name"]);
        let e = table(2, "Enrolled", &["sid", "cid"]);
        let join = LogicalPlan::Join {
            left: scan(&s),
            right: scan(&e),
            condition: None,
        };
        assert_eq!(
            join.output_columns(),
            vec!["student.sid", "student.name", "enrolled.sid", "enrolled.cid"]
        );
        let names: Vec<String> = join.tables().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["student", "enrolled"]);
    }

    #[test]
    fn test_group_sum_output_columns() {
        let e = table(2, "Enrolled", &["sid", "mark"]);
        let plan = LogicalPlan::GroupSum {
            input: scan(&e),
            group_by: vec![ColumnRef::new("sid")],
            output_keys: vec![ColumnRef::new("SID")],
            sums: vec![Expr::col("mark")],
            labels: vec!["sum(mark)".into()],
        };
        assert_eq!(plan.output_columns(), vec!["sid", "sum(mark)"]);
    }

    #[test]
    fn test_display_indents_children() {
        let s = table(1, "Student", &["sid"]);
        let plan = LogicalPlan::Sort {
            input: Box::new(LogicalPlan::Project {
                input: Box::new(LogicalPlan::Select {
                    input: scan(&s),
                    table: Arc::clone(&s),
                    predicate: Expr::binary(Expr::col("student.sid"), BinaryOperator::Gt, Expr::int(1)),
                }),
                columns: vec![ColumnRef::qualified("student", "sid")],
            }),
            keys: vec![OrderKey {
                reference: "student.sid".into(),
                index: 0,
                ascending: false,
            }],
        };
        assert_eq!(
            plan.to_string(),
            "Sort: [student.sid#0 DESC]\n  Project: [student.sid]\n    Select: student WHERE student.sid > 1\n      Scan: student\n"
        );
    }
}
