//! Broker sources: AMQP topology management and delivery fan-in.

pub mod amqp;
pub mod broker;
mod broker_source;

use std::sync::Arc;

use frog_core::SourceResult;

pub use amqp::{AmqpBroker, AmqpSourceError};
pub use broker::{
    ArcDynBroker, ArcDynChannel, Broker, BrokerChannel, Delivery,
    DeliveryStream,
};
pub use broker_source::{BrokerSource, SourceStreams, TeardownSummary};

/// Open the AMQP connection described by `dsn`.
pub async fn connect_broker(dsn: &str) -> SourceResult<ArcDynBroker> {
    Ok(Arc::new(AmqpBroker::connect(dsn).await?))
}
