//! Query result types.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::tuple::Tuple;

/// Rows produced by a query together with the references naming each field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    /// Output references in order, e.g. `student.sid` or `sum(enrolled.mark)`.
    pub columns: Vec<String>,
    /// Result rows in emission order.
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, tuple: Tuple) {
        self.rows.push(tuple.into_values());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows rendered the way the output file shows them.
    pub fn lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.iter().cloned().collect::<Tuple>().to_string())
            .collect()
    }

    /// Rows as JSON objects keyed by output reference.
    ///
    /// Integer-looking fields become JSON numbers. Repeated references keep
    /// the last value.
    pub fn to_json_rows(&self) -> Vec<BTreeMap<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| json_value(v)))
                    .collect()
            })
            .collect()
    }
}

fn json_value(field: &str) -> Value {
    match field.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(field.to_string()),
    }
}
