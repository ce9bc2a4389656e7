use polars::prelude::PolarsError;
use thiserror::Error;

use pollster_schema::SchemaError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("no such table: {0}")]
    NoSuchTable(String),
    #[error("table already exists: {0}")]
    TableExists(String),
    #[error("cannot generate tables for a survey with no shortname")]
    MissingShortname,
}

pub type Result<T> = std::result::Result<T, StoreError>;
