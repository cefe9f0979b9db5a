use axum::http::StatusCode;
use frog_core::{SourceError, TargetParseError};
use tracing::{error, warn};

#[derive(Debug)]
pub enum TargetAPIError {
    MissingParam(&'static str),
    InvalidTarget(TargetParseError),
    Broker(SourceError),
    NotFound(String),
    BadPath(String),
    Io(std::io::Error),
}

impl std::fmt::Display for TargetAPIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetAPIError::MissingParam(name) => {
                write!(f, "missing query parameter {name}")
            }
            TargetAPIError::InvalidTarget(e) => std::fmt::Display::fmt(e, f),
            TargetAPIError::Broker(e) => write!(f, "broker error: {e}"),
            TargetAPIError::NotFound(what) => write!(f, "{what} not found"),
            TargetAPIError::BadPath(path) => write!(f, "invalid path {path:?}"),
            TargetAPIError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for TargetAPIError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TargetAPIError::InvalidTarget(e) => Some(e),
            TargetAPIError::Broker(e) => Some(e),
            TargetAPIError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TargetParseError> for TargetAPIError {
    fn from(value: TargetParseError) -> Self {
        TargetAPIError::InvalidTarget(value)
    }
}

impl From<SourceError> for TargetAPIError {
    fn from(value: SourceError) -> Self {
        TargetAPIError::Broker(value)
    }
}

pub fn target_error(err: TargetAPIError) -> (StatusCode, String) {
    let status = match &err {
        TargetAPIError::MissingParam(_)
        | TargetAPIError::InvalidTarget(_)
        | TargetAPIError::BadPath(_) => StatusCode::BAD_REQUEST,
        TargetAPIError::NotFound(_) => StatusCode::NOT_FOUND,
        TargetAPIError::Broker(SourceError::Cancelled) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        TargetAPIError::Broker(_) => StatusCode::BAD_GATEWAY,
        TargetAPIError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, "target operation failed");
    } else {
        warn!(error = %err, "rejected request");
    }

    (status, err.to_string())
}
