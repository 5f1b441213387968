//! Splits a WHERE clause into conjuncts and hands them out by table.

use std::collections::BTreeSet;

use crate::catalog::normalize_name;
use crate::sql::{BinaryOperator, Expr};

/// Holds the top-level AND conjuncts of a WHERE clause.
///
/// Each conjunct is claimed by at most one `extract_*` call; the order in
/// which the planner asks decides where a conjunct lands.
#[derive(Debug, Default)]
pub struct WhereClassifier {
    conjuncts: Vec<Option<Conjunct>>,
}

#[derive(Debug)]
struct Conjunct {
    expr: Expr,
    tables: BTreeSet<String>,
}

impl WhereClassifier {
    pub fn new(predicate: Option<&Expr>) -> Self {
        let mut flat = Vec::new();
        if let Some(p) = predicate {
            split_and(p, &mut flat);
        }
        let conjuncts = flat
            .into_iter()
            .map(|expr| {
                let tables = referenced_tables(&expr);
                Some(Conjunct { expr, tables })
            })
            .collect();
        Self { conjuncts }
    }

    /// Unclaimed conjuncts, in WHERE order.
    pub fn pending(&self) -> impl Iterator<Item = &Expr> {
        self.conjuncts.iter().flatten().map(|c| &c.expr)
    }

    /// Claim conjuncts that mention no table other than `table`.
    pub fn extract_single_table(&mut self, table: &str) -> Vec<Expr> {
        let table = normalize_name(table);
        self.claim(|tables| tables.iter().all(|t| *t == table))
    }

    /// Claim conjuncts that mention `right_table` and otherwise only `left_tables`.
    ///
    /// A conjunct naming a table not yet joined stays pending for a later join.
    pub fn extract_join_predicates<S: AsRef<str>>(&mut self, left_tables: &[S], right_table: &str) -> Vec<Expr> {
        let right = normalize_name(right_table);
        let left: BTreeSet<String> = left_tables.iter().map(|t| normalize_name(t.as_ref())).collect();
        self.claim(|tables| tables.contains(&right) && tables.iter().all(|t| *t == right || left.contains(t)))
    }

    /// Claim everything still unclaimed.
    pub fn remaining(&mut self) -> Vec<Expr> {
        self.claim(|_| true)
    }

    fn claim(&mut self, mut wanted: impl FnMut(&BTreeSet<String>) -> bool) -> Vec<Expr> {
        let mut out = Vec::new();
        for slot in self.conjuncts.iter_mut() {
            if slot.as_ref().is_some_and(|c| wanted(&c.tables)) {
                if let Some(c) = slot.take() {
                    out.push(c.expr);
                }
            }
        }
        out
    }
}

fn split_and(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            split_and(left, out);
            split_and(right, out);
        }
        other => out.push(other.clone()),
    }
}

/// Table qualifiers mentioned by `expr`. Bare columns mention no table.
pub fn referenced_tables(expr: &Expr) -> BTreeSet<String> {
    let mut tables = BTreeSet::new();
    expr.for_each_column(&mut |c| {
        if let Some(t) = &c.table {
            tables.insert(normalize_name(t));
        }
    });
    tables
}

/// Join conjuncts back together with AND. `None` when there are none.
pub fn conjoin(exprs: Vec<Expr>) -> Option<Expr> {
    exprs
        .into_iter()
        .reduce(|acc, e| Expr::binary(acc, BinaryOperator::And, e))
}
