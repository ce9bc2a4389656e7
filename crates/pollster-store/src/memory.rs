//! In-memory storage engine, used by tests and single-run tooling.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;

use crate::engine::{BackendKind, StorageEngine, run_sql};
use crate::error::{Result, StoreError};

#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: BTreeMap<String, DataFrame>,
    views: Vec<(String, String)>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemoryEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
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
        Ok(())
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        if self.tables.contains_key(to) {
            return Err(StoreError::TableExists(to.to_string()));
        }
        let frame = self
            .tables
            .remove(from)
            .ok_or_else(|| StoreError::NoSuchTable(from.to_string()))?;
        self.tables.insert(to.to_string(), frame);
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<()> {
        self.tables.remove(name);
        Ok(())
    }

    fn read_table(&self, name: &str) -> Result<DataFrame> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))
    }

    fn append_rows(&mut self, name: &str, rows: DataFrame) -> Result<()> {
        let frame = self
            .tables
            .get_mut(name)
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))?;
        // An empty table adopts the incoming schema: column dtypes can be
        // widened by storage round-trips before the first row arrives.
        *frame = if frame.height() == 0 {
            rows
        } else {
            frame.vstack(&rows)?
        };
        Ok(())
    }

    fn replace_rows(&mut self, name: &str, rows: DataFrame) -> Result<()> {
        let frame = self
            .tables
            .get_mut(name)
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))?;
        *frame = rows;
        Ok(())
    }

    fn has_view(&self, name: &str) -> bool {
        self.views.iter().any(|(view, _)| view == name)
    }

    fn create_view(&mut self, name: &str, sql: &str) -> Result<()> {
        self.views.retain(|(view, _)| view != name);
        self.views.push((name.to_string(), sql.to_string()));
        Ok(())
    }

    fn drop_view(&mut self, name: &str) -> Result<()> {
        self.views.retain(|(view, _)| view != name);
        Ok(())
    }

    fn views(&self) -> Vec<(String, String)> {
        self.views.clone()
    }

    fn query(&self, sql: &str) -> Result<DataFrame> {
        run_sql(self.tables.iter(), &self.views, sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn one_column_frame(values: &[i64]) -> DataFrame {
        DataFrame::new(vec![Series::new("n".into(), values).into()]).unwrap()
    }

    #[test]
    fn rename_moves_data_and_frees_old_name() {
        let mut engine = MemoryEngine::new();
        engine.create_table("a", one_column_frame(&[1, 2])).unwrap();
        engine.rename_table("a", "a_backup").unwrap();
        assert!(!engine.has_table("a"));
        assert_eq!(engine.read_table("a_backup").unwrap().height(), 2);
    }

    #[test]
    fn rename_refuses_to_clobber() {
        let mut engine = MemoryEngine::new();
        engine.create_table("a", one_column_frame(&[1])).unwrap();
        engine.create_table("b", one_column_frame(&[2])).unwrap();
        assert!(matches!(
            engine.rename_table("a", "b"),
            Err(StoreError::TableExists(_))
        ));
    }

    #[test]
    fn append_then_replace() {
        let mut engine = MemoryEngine::new();
        engine.create_table("a", one_column_frame(&[1])).unwrap();
        engine.append_rows("a", one_column_frame(&[2, 3])).unwrap();
        assert_eq!(engine.read_table("a").unwrap().height(), 3);
        engine.replace_rows("a", one_column_frame(&[9])).unwrap();
        assert_eq!(engine.read_table("a").unwrap().height(), 1);
    }
}
