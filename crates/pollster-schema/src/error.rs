use thiserror::Error;

/// Schema compilation failures.
///
/// These indicate malformed authoring data reaching the compiler, which
/// `check()` should have caught; they are programmer errors, not runtime
/// conditions to recover from.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown question data type: {0}")]
    UnknownType(String),
    #[error("invalid format pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}
