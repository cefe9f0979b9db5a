use frog_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmqpSourceError {
    #[error("invalid amqp dsn: {0}")]
    InvalidDsn(String),

    #[error("connect failed: {0}")]
    Connect(#[source] lapin::Error),

    #[error("channel failed: {0}")]
    Channel(#[source] lapin::Error),

    #[error("declare exchange {exchange} failed: {source}")]
    Declare {
        exchange: String,
        #[source]
        source: lapin::Error,
    },

    #[error("declare/bind queue {queue} failed: {source}")]
    QueueSetup {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("consume on {queue} failed: {source}")]
    Consume {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("delete queue {queue} failed: {source}")]
    Delete {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("ack failed: {0}")]
    Ack(#[source] lapin::Error),
}

pub type AmqpSourceResult<T> = Result<T, AmqpSourceError>;

impl From<AmqpSourceError> for SourceError {
    fn from(e: AmqpSourceError) -> Self {
        match e {
            AmqpSourceError::InvalidDsn(dsn) => SourceError::Connect {
                details: format!("invalid AMQP DSN: {dsn}").into(),
            },
            AmqpSourceError::Connect(e) => SourceError::Connect {
                details: e.to_string().into(),
            },
            AmqpSourceError::Channel(e) => SourceError::Channel {
                details: e.to_string().into(),
            },
            AmqpSourceError::Declare { exchange, source } => {
                SourceError::Declare {
                    exchange,
                    details: source.to_string().into(),
                }
            }
            AmqpSourceError::QueueSetup { queue, source } => SourceError::Bind {
                queue,
                details: source.to_string().into(),
            },
            AmqpSourceError::Consume { queue, source } => SourceError::Consume {
                queue,
                details: source.to_string().into(),
            },
            AmqpSourceError::Delete { queue, source } => SourceError::Delete {
                queue,
                details: source.to_string().into(),
            },
            AmqpSourceError::Ack(e) => SourceError::Ack {
                details: e.to_string().into(),
            },
        }
    }
}
