//! Storage engine abstraction.
//!
//! Tables are polars DataFrames keyed by name; views are named stored SQL
//! evaluated lazily at query time. The SQL surface runs through polars'
//! SQL context with every table and view registered, so a failed query
//! cannot damage engine state. The chart read paths rely on that
//! per-statement isolation.

use polars::prelude::{DataFrame, IntoLazy};
use polars::sql::SQLContext;
use tracing::warn;

use crate::error::Result;

/// Which engine flavor is backing the store. Auxiliary per-survey SQL is
/// keyed by this, mirroring dialect differences such as identifier
/// quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory tables; the lightweight embedded engine.
    Memory,
    /// One CSV file per table under a data directory.
    Disk,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Disk => "disk",
        }
    }
}

/// Narrow relational interface the survey core needs from a backend.
pub trait StorageEngine {
    fn kind(&self) -> BackendKind;

    fn table_names(&self) -> Vec<String>;
    fn has_table(&self, name: &str) -> bool;
    fn create_table(&mut self, name: &str, frame: DataFrame) -> Result<()>;
    fn rename_table(&mut self, from: &str, to: &str) -> Result<()>;
    /// Dropping a missing table is not an error.
    fn drop_table(&mut self, name: &str) -> Result<()>;
    fn read_table(&self, name: &str) -> Result<DataFrame>;
    fn append_rows(&mut self, name: &str, rows: DataFrame) -> Result<()>;
    /// Delete-then-insert: the table keeps its identity, its contents are
    /// replaced wholesale.
    fn replace_rows(&mut self, name: &str, rows: DataFrame) -> Result<()>;

    fn has_view(&self, name: &str) -> bool;
    fn create_view(&mut self, name: &str, sql: &str) -> Result<()>;
    /// Dropping a missing view is not an error.
    fn drop_view(&mut self, name: &str) -> Result<()>;
    /// View definitions in creation order (later views may reference
    /// earlier ones).
    fn views(&self) -> Vec<(String, String)>;

    /// Execute one SQL statement against the current tables and views.
    fn query(&self, sql: &str) -> Result<DataFrame>;
}

/// Run a query with the given tables and views registered.
///
/// Views are planned in creation order. A view whose definition no longer
/// plans, say because its base table was archived under a backup name, is
/// skipped with a warning: only queries naming that view fail, every other
/// statement still runs.
pub(crate) fn run_sql<'a>(
    tables: impl Iterator<Item = (&'a String, &'a DataFrame)>,
    views: &[(String, String)],
    sql: &str,
) -> Result<DataFrame> {
    let mut ctx = SQLContext::new();
    for (name, frame) in tables {
        ctx.register(name, frame.clone().lazy());
    }
    for (name, view_sql) in views {
        match ctx.execute(view_sql) {
            Ok(plan) => ctx.register(name, plan),
            Err(err) => warn!(view = %name, error = %err, "skipping unplannable view"),
        }
    }
    Ok(ctx.execute(sql)?.collect()?)
}
