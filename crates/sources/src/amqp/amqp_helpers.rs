//! AMQP option sets and connection setup.

use common::{AmqpEndpoint, redact_dsn};
use lapin::{
    Connection, ConnectionProperties,
    options::{
        BasicConsumeOptions, ExchangeDeclareOptions, QueueDeclareOptions,
        QueueDeleteOptions,
    },
};
use tracing::{debug, info};

use super::{AmqpSourceError, AmqpSourceResult};

pub const CONNECTION_NAME: &str = "frog";

pub(super) fn exchange_options() -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable: true,
        auto_delete: false,
        internal: false,
        ..ExchangeDeclareOptions::default()
    }
}

pub(super) fn queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        exclusive: false,
        auto_delete: false,
        ..QueueDeclareOptions::default()
    }
}

pub(super) fn consume_options(auto_ack: bool) -> BasicConsumeOptions {
    BasicConsumeOptions {
        no_ack: auto_ack,
        exclusive: false,
        ..BasicConsumeOptions::default()
    }
}

/// Deletes even when the queue still holds messages or consumers.
pub(super) fn delete_options() -> QueueDeleteOptions {
    QueueDeleteOptions {
        if_unused: false,
        if_empty: false,
        ..QueueDeleteOptions::default()
    }
}

/// Validate the DSN and open a connection. No retry.
pub(super) async fn connect(dsn: &str) -> AmqpSourceResult<Connection> {
    let endpoint = AmqpEndpoint::from_url(dsn).map_err(|e| {
        AmqpSourceError::InvalidDsn(format!("{} ({e})", redact_dsn(dsn)))
    })?;
    debug!(addr = %endpoint.display_addr(), tls = endpoint.tls, "connecting to broker");

    let props = ConnectionProperties::default()
        .with_connection_name(CONNECTION_NAME.into());
    let conn = Connection::connect(dsn, props)
        .await
        .map_err(AmqpSourceError::Connect)?;

    info!(
        addr = %endpoint.display_addr(),
        user = %endpoint.user,
        "broker connected"
    );
    Ok(conn)
}
