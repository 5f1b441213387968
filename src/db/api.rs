//! Database API - high-level interface for LightDB.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogError, SchemaLoader, TableMeta};
use crate::executor::{ExecuteError, QueryExecutor, ResultSet};
use crate::logging;
use crate::planner::{PlanBuilder, PlanError, QueryPlan};
use crate::sql::{ParseError, Parser, Select, Statement};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("execution error: {0}")]
    Execute(#[from] ExecuteError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("database not found: {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database configuration options.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database directory.
    pub path: PathBuf,
    /// Schema file, relative to `path` unless absolute.
    pub schema_file: PathBuf,
    /// Directory holding one data file per table, relative to `path` unless absolute.
    pub data_dir: PathBuf,
    /// Keep a JSON catalog snapshot in the database directory.
    pub persist_catalog: bool,
    /// Log at `debug` instead of `warn` unless `RUST_LOG` says otherwise.
    pub verbose: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            schema_file: PathBuf::from("schema.txt"),
            data_dir: PathBuf::from("data"),
            persist_catalog: false,
            verbose: false,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn schema_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.schema_file = file.into();
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set persist_catalog flag.
    pub fn persist_catalog(mut self, value: bool) -> Self {
        self.persist_catalog = value;
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Resolved location of the schema file.
    pub fn schema_path(&self) -> PathBuf {
        self.path.join(&self.schema_file)
    }

    /// Resolved location of the data directory.
    pub fn data_path(&self) -> PathBuf {
        self.path.join(&self.data_dir)
    }
}

/// The main database handle.
///
/// Holds the catalog for one database directory. Every query gets its own
/// operator tree; nothing is cached between queries.
pub struct Database {
    config: DatabaseConfig,
    catalog: Catalog,
}

impl Database {
    /// Open the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::new(path.as_ref()))
    }

    /// Open a database with custom configuration.
    ///
    /// Installs the stderr log subscriber for `config.verbose` if none is set yet.
    pub fn open_with_config(config: DatabaseConfig) -> DatabaseResult<Self> {
        logging::init(config.verbose);

        if !config.path.is_dir() {
            return Err(DatabaseError::NotFound(config.path.clone()));
        }

        let catalog = if config.persist_catalog {
            Catalog::open(&config.path)?
        } else {
            Catalog::in_memory()
        };
        SchemaLoader::load_into(&catalog, &config.schema_path(), &config.data_path())?;

        info!(
            path = %config.path.display(),
            tables = catalog.list_tables().len(),
            "opened database"
        );
        Ok(Self { config, catalog })
    }

    /// Run a query and collect its rows.
    pub fn query(&self, sql: &str) -> DatabaseResult<ResultSet> {
        let QueryPlan {
            mut root,
            output_schema,
            ..
        } = self.plan(sql)?;
        Ok(QueryExecutor::collect(root.as_mut(), output_schema)?)
    }

    /// Run a query, writing one line per row to `out`. Returns the row count.
    pub fn execute_to<W: Write>(&self, sql: &str, out: W) -> DatabaseResult<usize> {
        let mut plan = self.plan(sql)?;
        Ok(QueryExecutor::execute(plan.root.as_mut(), out)?)
    }

    /// Run the single query in `input`, writing its rows to `output`.
    ///
    /// The output file is only created once the query has been planned, so
    /// parse and planning errors leave no file behind.
    pub fn run_query_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> DatabaseResult<usize> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let select = Self::select_of(Parser::parse_file(input)?);
        let mut plan = PlanBuilder::build(&select, &self.catalog)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(output)?);
        let rows = QueryExecutor::execute(plan.root.as_mut(), writer)?;

        info!(input = %input.display(), output = %output.display(), rows, "query complete");
        Ok(rows)
    }

    /// Render the logical plan of a query.
    pub fn explain(&self, sql: &str) -> DatabaseResult<String> {
        let select = Self::select_of(Parser::parse(sql)?);
        Ok(PlanBuilder::logical(&select, &self.catalog)?.to_string())
    }

    /// Parse a SQL statement without executing.
    pub fn parse(&self, sql: &str) -> DatabaseResult<Statement> {
        Ok(Parser::parse(sql)?)
    }

    fn plan(&self, sql: &str) -> DatabaseResult<QueryPlan> {
        debug!(sql, "planning query");
        let select = Self::select_of(Parser::parse(sql)?);
        Ok(PlanBuilder::build(&select, &self.catalog)?)
    }

    fn select_of(stmt: Statement) -> Select {
        match stmt {
            Statement::Select(select) => select,
        }
    }

    /// List all tables.
    pub fn tables(&self) -> Vec<String> {
        self.catalog.list_tables().iter().map(|t| t.name.clone()).collect()
    }

    /// Get the metadata for a table.
    pub fn table(&self, name: &str) -> Option<std::sync::Arc<TableMeta>> {
        self.catalog.get_table(name).ok()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SNAPSHOT_FILE;
    use crate::db::test_support::university_dir;
    use tempfile::TempDir;

    fn lines(db: &Database, sql: &str) -> Vec<String> {
        db.query(sql).unwrap().lines()
    }

    #[test]
    fn test_open_database() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.tables(), vec!["course", "enrolled", "student"]);
        assert!(db.table("Student").is_some());
        assert!(db.catalog().snapshot_path().is_none());
    }

    #[test]
    fn test_open_installs_log_subscriber() {
        let dir = university_dir();
        let db = Database::open_with_config(DatabaseConfig::new(dir.path()).verbose(true)).unwrap();
        assert!(db.config().verbose);
        assert!(tracing::dispatcher::has_been_set());
    }

    #[test]
    fn test_open_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Database::open(dir.path().join("missing")),
            Err(DatabaseError::NotFound(_))
        ));
        assert!(matches!(
            Database::open(dir.path()),
            Err(DatabaseError::Catalog(CatalogError::Io(_)))
        ));
    }

    #[test]
    fn test_select_star() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        let rs = db.query("SELECT * FROM Student").unwrap();
        assert_eq!(rs.columns, vec!["student.sid", "student.name", "student.age"]);
        assert_eq!(rs.lines(), vec!["1, ada, 22", "2, bob, 19", "3, cy, 25", "4, dee, 21"]);
    }

    #[test]
    fn test_selection_and_projection() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(
            lines(&db, "SELECT Student.name FROM Student WHERE Student.age > 20"),
            vec!["ada", "cy", "dee"]
        );
        assert_eq!(
            lines(&db, "SELECT age, name, age FROM Student WHERE sid >= 2 AND sid <> 3"),
            vec!["19, bob, 19", "21, dee, 21"]
        );
        assert!(lines(&db, "SELECT * FROM Student WHERE Student.age > 100").is_empty());
    }

    #[test]
    fn test_three_way_join_follows_from_order() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(
            lines(
                &db,
                "SELECT Student.name, Course.title FROM Student, Enrolled, Course \
                 WHERE Student.sid = Enrolled.sid AND Enrolled.cid = Course.cid"
            ),
            vec!["ada, db", "ada, os", "bob, db", "cy, ml", "cy, db"]
        );
    }

    #[test]
    fn test_cross_product() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.query("SELECT * FROM Student, Course").unwrap().len(), 12);
    }

    #[test]
    fn test_group_sum() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();

        let rs = db
            .query("SELECT Enrolled.sid, SUM(Enrolled.mark) FROM Enrolled GROUP BY Enrolled.sid")
            .unwrap();
        assert_eq!(rs.columns, vec!["enrolled.sid", "sum(enrolled.mark)"]);
        assert_eq!(rs.lines(), vec!["1, 150", "2, 65", "3, 140"]);

        assert_eq!(
            lines(
                &db,
                "SELECT Enrolled.sid, SUM(Enrolled.mark) FROM Enrolled \
                 GROUP BY Enrolled.sid ORDER BY SUM(Enrolled.mark) DESC"
            ),
            vec!["1, 150", "3, 140", "2, 65"]
        );
    }

    #[test]
    fn test_global_and_implicit_grouping() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(lines(&db, "SELECT SUM(mark) FROM Enrolled"), vec!["355"]);
        assert_eq!(lines(&db, "SELECT SUM(mark) FROM Enrolled WHERE mark > 100"), vec!["0"]);
        assert_eq!(lines(&db, "SELECT SUM(Course.credits * 2) FROM Course"), vec!["22"]);

        // Without GROUP BY the projected columns become the grouping keys.
        assert_eq!(
            lines(&db, "SELECT Enrolled.cid, SUM(Enrolled.mark) FROM Enrolled"),
            vec!["101, 195", "102, 70", "103, 90"]
        );
        assert_eq!(
            lines(&db, "SELECT Enrolled.cid FROM Enrolled GROUP BY Enrolled.cid"),
            vec!["101", "102", "103"]
        );
    }

    #[test]
    fn test_join_group_order() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(
            lines(
                &db,
                "SELECT Student.name, SUM(Enrolled.mark) FROM Student, Enrolled \
                 WHERE Student.sid = Enrolled.sid GROUP BY Student.name ORDER BY SUM(Enrolled.mark)"
            ),
            vec!["bob, 65", "cy, 140", "ada, 150"]
        );
    }

    #[test]
    fn test_distinct_and_order() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(
            lines(&db, "SELECT DISTINCT Enrolled.cid FROM Enrolled"),
            vec!["101", "102", "103"]
        );
        assert_eq!(
            lines(&db, "SELECT DISTINCT Enrolled.cid FROM Enrolled ORDER BY Enrolled.cid DESC"),
            vec!["103", "102", "101"]
        );
        assert_eq!(
            lines(&db, "SELECT * FROM Enrolled ORDER BY Enrolled.cid, Enrolled.mark DESC"),
            vec!["1, 101, 80", "2, 101, 65", "3, 101, 50", "1, 102, 70", "3, 103, 90"]
        );
    }

    #[test]
    fn test_order_by_alias_and_tie_break() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(
            lines(&db, "SELECT Student.name, Student.age FROM Student ORDER BY age DESC"),
            vec!["cy, 25", "ada, 22", "dee, 21", "bob, 19"]
        );
        assert_eq!(
            lines(&db, "SELECT Course.credits, Course.title FROM Course ORDER BY credits"),
            vec!["3, os", "4, db", "4, ml"]
        );
    }

    #[test]
    fn test_query_errors() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();

        assert!(matches!(db.query("SELEC * FROM Student"), Err(DatabaseError::Parse(_))));
        assert!(matches!(db.query("SELECT * FROM Nope"), Err(DatabaseError::Plan(_))));
        assert!(matches!(
            db.query("SELECT * FROM Student WHERE Student.name = 1"),
            Err(DatabaseError::Execute(ExecuteError::TypeCoercion(_)))
        ));
        assert!(matches!(
            db.query("SELECT * FROM Student ORDER BY Student.name"),
            Err(DatabaseError::Execute(ExecuteError::TypeCoercion(_)))
        ));
    }

    #[test]
    fn test_explain() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        let plan = db.explain("SELECT Student.name FROM Student WHERE age > 20").unwrap();
        assert_eq!(
            plan,
            "Project: [student.name]\n  Select: student WHERE student.age > 20\n    Scan: student\n"
        );
    }

    #[test]
    fn test_run_query_file() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        let input = dir.path().join("query1.sql");
        let output = dir.path().join("out").join("nested").join("query1.csv");
        fs::write(&input, "SELECT Course.title FROM Course WHERE Course.credits = 4;\n").unwrap();

        assert_eq!(db.run_query_file(&input, &output).unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "db\nml\n");
    }

    #[test]
    fn test_run_query_file_empty_result() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        let input = dir.path().join("q.sql");
        let output = dir.path().join("q.csv");
        fs::write(&input, "SELECT * FROM Course WHERE credits > 10").unwrap();

        assert_eq!(db.run_query_file(&input, &output).unwrap(), 0);
        assert_eq!(fs::read_to_string(&output).unwrap(), "");
    }

    #[test]
    fn test_plan_error_leaves_no_output_file() {
        let dir = university_dir();
        let db = Database::open(dir.path()).unwrap();
        let input = dir.path().join("bad.sql");
        let output = dir.path().join("bad.csv");
        fs::write(&input, "SELECT nope FROM Course").unwrap();

        assert!(db.run_query_file(&input, &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_persisted_catalog_reopens() {
        let dir = university_dir();
        let config = DatabaseConfig::new(dir.path()).persist_catalog(true).verbose(true);
        {
            let db = Database::open_with_config(config.clone()).unwrap();
            assert_eq!(db.tables().len(), 3);
        }
        assert!(dir.path().join(SNAPSHOT_FILE).exists());

        let db = Database::open_with_config(config).unwrap();
        assert_eq!(db.tables().len(), 3);
        assert_eq!(lines(&db, "SELECT SUM(credits) FROM Course"), vec!["11"]);
    }

    #[test]
    fn test_custom_layout() {
        let dir = university_dir();
        fs::rename(dir.path().join("schema.txt"), dir.path().join("tables.def")).unwrap();
        fs::rename(dir.path().join("data"), dir.path().join("csv")).unwrap();

        let config = DatabaseConfig::new(dir.path()).schema_file("tables.def").data_dir("csv");
        let db = Database::open_with_config(config).unwrap();
        assert_eq!(lines(&db, "SELECT Course.cid FROM Course WHERE cid < 102"), vec!["101"]);
    }
}
