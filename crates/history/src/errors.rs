use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("i/o error while accessing history: {0}")]
    Io(#[from] io::Error),

    #[error("history serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;
