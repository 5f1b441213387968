//! The row type flowing between operators.

use std::fmt;

use super::error::{ExecuteError, ExecuteResult};

/// Field separator in table data files.
pub const FIELD_DELIMITER: char = ',';

/// Field separator used when rendering result rows.
pub const OUTPUT_DELIMITER: &str = ", ";

/// An immutable, ordered row of text fields.
///
/// Equality and hashing are structural, which is what duplicate
/// elimination and grouping rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tuple {
    values: Vec<String>,
}

impl Tuple {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Split one line of a data file into trimmed fields.
    pub fn from_line(line: &str, delimiter: char) -> Self {
        line.split(delimiter).map(str::trim).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field at `index`.
    pub fn get(&self, index: usize) -> ExecuteResult<&str> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or(ExecuteError::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// A new tuple holding this tuple's fields followed by `other`'s.
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Tuple { values }
    }

    /// A new tuple made of the fields at `indexes`, in that order.
    pub fn pick(&self, indexes: &[usize]) -> ExecuteResult<Tuple> {
        indexes
            .iter()
            .map(|&i| self.get(i).map(str::to_string))
            .collect::<ExecuteResult<Vec<_>>>()
            .map(Tuple::new)
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

impl<S: Into<String>> FromIterator<S> for Tuple {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Tuple::new(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values.join(OUTPUT_DELIMITER))
    }
}
