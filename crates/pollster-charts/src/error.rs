use polars::prelude::PolarsError;
use pollster_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid global id: {0}")]
    InvalidGlobalId(String),
    #[error("tile renderer: {0}")]
    Renderer(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;
