//! Table scan over a delimited data file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use tracing::debug;

use super::Operator;
use crate::catalog::{Catalog, TableMeta};
use crate::executor::error::{ExecuteError, ExecuteResult};
use crate::executor::tuple::{Tuple, FIELD_DELIMITER};

/// Leaf operator reading one tuple per non-blank line of a table's data file.
pub struct ScanOperator {
    table: Arc<TableMeta>,
    reader: BufReader<File>,
    line: String,
}

impl ScanOperator {
    /// Open a scan over `table`. Fails if the data file cannot be opened.
    pub fn new(table: Arc<TableMeta>) -> ExecuteResult<Self> {
        let reader = Self::open(&table)?;
        Ok(Self {
            table,
            reader,
            line: String::new(),
        })
    }

    /// Look `name` up in `catalog` and open a scan over it.
    pub fn from_catalog(catalog: &Catalog, name: &str) -> ExecuteResult<Self> {
        Self::new(catalog.get_table(name)?)
    }

    pub fn table(&self) -> &TableMeta {
        &self.table
    }

    fn open(table: &TableMeta) -> ExecuteResult<BufReader<File>> {
        let file = File::open(&table.data_file)
            .map_err(|e| ExecuteError::io(table.data_file.display(), e))?;
        debug!(table = %table.name, file = %table.data_file.display(), "opened scan");
        Ok(BufReader::new(file))
    }
}

impl Operator for ScanOperator {
    fn next_tuple(&mut self) -> ExecuteResult<Option<Tuple>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| ExecuteError::io(self.table.data_file.display(), e))?;
            if read == 0 {
                return Ok(None);
            }
            let line = self.line.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(Tuple::from_line(line, FIELD_DELIMITER)));
        }
    }

    fn reset(&mut self) -> ExecuteResult<()> {
        self.reader = Self::open(&self.table)?;
        Ok(())
    }
}
