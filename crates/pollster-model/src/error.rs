use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown prefill policy: {0}")]
    UnknownPrefillPolicy(String),
    #[error("unknown survey status: {0}")]
    UnknownStatus(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
