//! Column reference resolution.
//!
//! A resolver maps `(table?, column)` to a field offset inside the tuples an
//! operator sees. Names are compared after trimming and lowercasing.

use std::sync::Arc;

use super::error::{ExecuteError, ExecuteResult};
use crate::catalog::{normalize_name, TableMeta};
use crate::sql::ColumnRef;

/// Maps column references to tuple offsets.
pub trait ColumnResolver {
    /// Offset of `column`, optionally qualified by `table`.
    fn resolve(&self, table: Option<&str>, column: &str) -> ExecuteResult<usize>;

    /// Number of fields in the tuples this resolver describes.
    fn width(&self) -> usize;

    fn resolve_ref(&self, column: &ColumnRef) -> ExecuteResult<usize> {
        self.resolve(column.table.as_deref(), &column.column)
    }

    /// Resolve `t.c` or `c` text.
    fn resolve_text(&self, reference: &str) -> ExecuteResult<usize> {
        match reference.split_once('.') {
            Some((table, column)) => self.resolve(Some(table), column),
            None => self.resolve(None, reference),
        }
    }
}

fn display_ref(table: Option<&str>, column: &str) -> String {
    match table.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => format!("{}.{}", normalize_name(t), normalize_name(column)),
        None => normalize_name(column),
    }
}

/// Resolver over the tuples of one table.
#[derive(Debug, Clone)]
pub struct SingleTableResolver {
    table: String,
    columns: Vec<String>,
}

impl SingleTableResolver {
    pub fn new<S: AsRef<str>>(table: &str, columns: &[S]) -> Self {
        Self {
            table: normalize_name(table),
            columns: columns.iter().map(|c| normalize_name(c.as_ref())).collect(),
        }
    }

    pub fn for_table(meta: &TableMeta) -> Self {
        Self::new(&meta.name, meta.column_names().as_slice())
    }
}

impl ColumnResolver for SingleTableResolver {
    fn resolve(&self, table: Option<&str>, column: &str) -> ExecuteResult<usize> {
        if let Some(t) = table.map(str::trim).filter(|t| !t.is_empty()) {
            if normalize_name(t) != self.table {
                return Err(ExecuteError::UnknownColumn(display_ref(table, column)));
            }
        }
        let wanted = normalize_name(column);
        self.columns
            .iter()
            .position(|c| *c == wanted)
            .ok_or_else(|| ExecuteError::UnknownColumn(display_ref(table, column)))
    }

    fn width(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug, Clone)]
struct TableSlot {
    name: String,
    columns: Vec<String>,
    offset: usize,
}

/// Resolver over tuples that concatenate several tables left to right.
#[derive(Debug, Clone)]
pub struct MultiTableResolver {
    slots: Vec<TableSlot>,
    width: usize,
}

impl MultiTableResolver {
    /// Build from `(table, columns)` pairs in concatenation order.
    pub fn new<S: AsRef<str>>(tables: &[(&str, Vec<S>)]) -> Self {
        let mut slots = Vec::with_capacity(tables.len());
        let mut offset = 0;
        for (name, columns) in tables {
            let columns: Vec<String> = columns.iter().map(|c| normalize_name(c.as_ref())).collect();
            let width = columns.len();
            slots.push(TableSlot {
                name: normalize_name(name),
                columns,
                offset,
            });
            offset += width;
        }
        Self { slots, width: offset }
    }

    pub fn for_tables(tables: &[Arc<TableMeta>]) -> Self {
        let pairs: Vec<(&str, Vec<&str>)> = tables
            .iter()
            .map(|t| (t.name.as_str(), t.column_names()))
            .collect();
        Self::new(pairs.as_slice())
    }

    /// Table names in concatenation order.
    pub fn table_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Rewrite `column` as a normalized `table.column` reference.
    pub fn qualify(&self, column: &ColumnRef) -> ExecuteResult<ColumnRef> {
        let index = self.resolve_ref(column)?;
        let slot = self
            .slots
            .iter()
            .find(|s| index >= s.offset && index < s.offset + s.columns.len())
            .ok_or(ExecuteError::IndexOutOfRange {
                index,
                len: self.width,
            })?;
        Ok(ColumnRef::qualified(
            slot.name.clone(),
            slot.columns[index - slot.offset].clone(),
        ))
    }
}

impl ColumnResolver for MultiTableResolver {
    fn resolve(&self, table: Option<&str>, column: &str) -> ExecuteResult<usize> {
        let wanted = normalize_name(column);

        if let Some(t) = table.map(str::trim).filter(|t| !t.is_empty()) {
            let t = normalize_name(t);
            return self
                .slots
                .iter()
                .find(|s| s.name == t)
                .and_then(|s| s.columns.iter().position(|c| *c == wanted).map(|i| s.offset + i))
                .ok_or_else(|| ExecuteError::UnknownColumn(display_ref(table, column)));
        }

        let mut hits = self.slots.iter().filter_map(|s| {
            s.columns.iter().position(|c| *c == wanted).map(|i| s.offset + i)
        });
        match (hits.next(), hits.next()) {
            (Some(idx), None) => Ok(idx),
            (Some(_), Some(_)) => Err(ExecuteError::AmbiguousColumn(wanted)),
            (None, _) => Err(ExecuteError::UnknownColumn(wanted)),
        }
    }

    fn width(&self) -> usize {
        self.width
    }
}
