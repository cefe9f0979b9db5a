//! Broker seam: the handful of operations the adapter needs from AMQP.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use frog_core::{AckHandle, SourceResult};
use futures::stream::BoxStream;

/// One delivery off a queue.
///
/// `ack` is set only when the queue was consumed in manual-ack mode.
pub struct Delivery {
    pub body: Bytes,
    pub ack: Option<AckHandle>,
}

impl Delivery {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ack: None,
        }
    }

    pub fn with_ack(mut self, ack: AckHandle) -> Self {
        self.ack = Some(ack);
        self
    }
}

/// Deliveries of one consumer. Ends when the broker cancels the consumer
/// or the channel closes.
pub type DeliveryStream = BoxStream<'static, SourceResult<Delivery>>;

/// A connection to the broker.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Open a fresh channel. Each subscription gets its own.
    async fn open_channel(&self) -> SourceResult<ArcDynChannel>;

    async fn close(&self) -> SourceResult<()>;
}

/// Topology and consume operations on one channel.
///
/// Every declare is idempotent on the broker side as long as the
/// arguments match what already exists.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Durable topic exchange.
    async fn declare_exchange(&self, exchange: &str) -> SourceResult<()>;

    /// Durable, non-exclusive, non-auto-delete queue.
    async fn declare_queue(&self, queue: &str) -> SourceResult<()>;

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> SourceResult<()>;

    /// Limit unacknowledged deliveries in flight on this channel.
    async fn qos(&self, prefetch: u16) -> SourceResult<()>;

    async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        auto_ack: bool,
    ) -> SourceResult<DeliveryStream>;

    async fn delete_queue(&self, queue: &str) -> SourceResult<()>;
}

pub type ArcDynBroker = Arc<dyn Broker>;
pub type ArcDynChannel = Arc<dyn BrokerChannel>;
