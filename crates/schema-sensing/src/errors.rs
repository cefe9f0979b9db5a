//! Error types for drift evaluation.

use history::HistoryError;
use thiserror::Error;

/// Errors that stop a message from being evaluated.
///
/// Malformed payloads are not errors here; they come back as a
/// `decode_error` report.
#[derive(Debug, Error)]
pub enum EvaluateError {
    /// History store read/write failed
    #[error("history store: {0}")]
    History(#[from] HistoryError),
}

/// Result type for evaluator operations.
pub type EvaluateResult<T> = Result<T, EvaluateError>;
