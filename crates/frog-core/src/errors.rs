use std::borrow::Cow;
use std::io;
use thiserror::Error;

/// Failures raised by the broker adapter.
///
/// Every variant is fatal to the operation that produced it. Nothing in the
/// adapter retries; the orchestrator decides what to do next.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("connection error: {details}")]
    Connect { details: Cow<'static, str> },

    #[error("channel error: {details}")]
    Channel { details: Cow<'static, str> },

    #[error("exchange declare failed for {exchange}: {details}")]
    Declare {
        exchange: String,
        details: Cow<'static, str>,
    },

    #[error("queue {queue} setup failed: {details}")]
    Bind {
        queue: String,
        details: Cow<'static, str>,
    },

    #[error("consume on {queue} failed: {details}")]
    Consume {
        queue: String,
        details: Cow<'static, str>,
    },

    #[error("queue delete failed for {queue}: {details}")]
    Delete {
        queue: String,
        details: Cow<'static, str>,
    },

    #[error("acknowledgement failed: {details}")]
    Ack { details: Cow<'static, str> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SourceError {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Cancelled => "cancelled",
            SourceError::Connect { .. } => "connect",
            SourceError::Channel { .. } => "channel",
            SourceError::Declare { .. } => "declare",
            SourceError::Bind { .. } => "bind",
            SourceError::Consume { .. } => "consume",
            SourceError::Delete { .. } => "delete",
            SourceError::Ack { .. } => "ack",
            SourceError::Other(_) => "other",
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SinkError {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkError::Io(_) => "io error",
            SinkError::Serialization(_) => "serialization error",
            SinkError::Other(_) => "other error",
        }
    }
}

/// A target string that is not of the form `<exchange>:<routingKey>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target {input:?}: {reason}")]
pub struct TargetParseError {
    pub input: String,
    pub reason: &'static str,
}

pub type SourceResult<T> = Result<T, SourceError>;
pub type SinkResult<T> = std::result::Result<T, SinkError>;
