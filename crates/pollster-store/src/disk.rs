//! File-backed storage engine: one CSV file per table under a data
//! directory, with view definitions in a JSON sidecar.
//!
//! Frames are kept resident and written through on every mutation, so the
//! read paths never touch the filesystem. Renames map to file renames,
//! which is what makes the lifecycle's archive-by-rename cheap.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{CsvParseOptions, CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};
use tracing::debug;

use crate::engine::{BackendKind, StorageEngine, run_sql};
use crate::error::{Result, StoreError};

const VIEWS_FILE: &str = "views.json";

pub struct DiskEngine {
    root: PathBuf,
    tables: BTreeMap<String, DataFrame>,
    views: Vec<(String, String)>,
}

impl DiskEngine {
    /// Open (or initialize) a data directory, loading every `<table>.csv`
    /// plus the view sidecar.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let mut tables = BTreeMap::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let frame = read_table_file(&path)?;
            debug!(table = name, rows = frame.height(), "loaded table");
            tables.insert(name.to_string(), frame);
        }
        let views = read_views(&root.join(VIEWS_FILE))?;
        Ok(Self {
            root,
            tables,
            views,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    fn persist_table(&mut self, name: &str) -> Result<()> {
        let path = self.table_path(name);
        let frame = self
            .tables
            .get_mut(name)
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))?;
        let file = fs::File::create(path)?;
        CsvWriter::new(file).include_header(true).finish(frame)?;
        Ok(())
    }

    fn persist_views(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.views)?;
        fs::write(self.root.join(VIEWS_FILE), json)?;
        Ok(())
    }
}

fn read_table_file(path: &Path) -> Result<DataFrame> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(frame)
}

fn read_views(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

impl StorageEngine for DiskEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Disk
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    fn create_table(&mut self, name: &str, frame: DataFrame) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(StoreError::TableExists(name.to_string()));
        }
        self.tables.insert(name.to_string(), frame);
        self.persist_table(name)
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        if self.tables.contains_key(to) {
            return Err(StoreError::TableExists(to.to_string()));
        }
        let frame = self
            .tables
            .remove(from)
            .ok_or_else(|| StoreError::NoSuchTable(from.to_string()))?;
        fs::rename(self.table_path(from), self.table_path(to))?;
        self.tables.insert(to.to_string(), frame);
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_some() {
            let path = self.table_path(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn read_table(&self, name: &str) -> Result<DataFrame> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))
    }

    fn append_rows(&mut self, name: &str, rows: DataFrame) -> Result<()> {
        {
            let frame = self
                .tables
                .get_mut(name)
                .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))?;
            // Empty tables adopt the incoming schema: CSV round-trips lose
            // dtypes when no data rows exist yet.
            *frame = if frame.height() == 0 {
                rows
            } else {
                frame.vstack(&rows)?
            };
        }
        self.persist_table(name)
    }

    fn replace_rows(&mut self, name: &str, rows: DataFrame) -> Result<()> {
        if !self.tables.contains_key(name) {
            return Err(StoreError::NoSuchTable(name.to_string()));
        }
        self.tables.insert(name.to_string(), rows);
        self.persist_table(name)
    }

    fn has_view(&self, name: &str) -> bool {
        self.views.iter().any(|(view, _)| view == name)
    }

    fn create_view(&mut self, name: &str, sql: &str) -> Result<()> {
        self.views.retain(|(view, _)| view != name);
        self.views.push((name.to_string(), sql.to_string()));
        self.persist_views()
    }

    fn drop_view(&mut self, name: &str) -> Result<()> {
        self.views.retain(|(view, _)| view != name);
        self.persist_views()
    }

    fn views(&self) -> Vec<(String, String)> {
        self.views.clone()
    }

    fn query(&self, sql: &str) -> Result<DataFrame> {
        run_sql(self.tables.iter(), &self.views, sql)
    }
}
