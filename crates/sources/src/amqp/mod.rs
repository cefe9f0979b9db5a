//! AMQP 0-9-1 broker backed by `lapin`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use frog_core::{Ack, SourceError, SourceResult};
use futures::StreamExt;
use lapin::{
    Channel, Connection, ExchangeKind, acker::Acker, options::BasicAckOptions,
    options::BasicQosOptions, options::QueueBindOptions, types::FieldTable,
};
use tracing::{debug, warn};

use crate::broker::{ArcDynChannel, Broker, BrokerChannel, Delivery, DeliveryStream};

mod amqp_errors;
pub use amqp_errors::{AmqpSourceError, AmqpSourceResult};

mod amqp_helpers;
use amqp_helpers::{
    connect, consume_options, delete_options, exchange_options, queue_options,
};

// ============================================================================
// Connection
// ============================================================================

pub struct AmqpBroker {
    conn: Connection,
}

impl AmqpBroker {
    /// Connect to `dsn`. Fails fast; nothing is retried.
    pub async fn connect(dsn: &str) -> SourceResult<Self> {
        let conn = connect(dsn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    async fn open_channel(&self) -> SourceResult<ArcDynChannel> {
        let channel = self
            .conn
            .create_channel()
            .await
            .map_err(AmqpSourceError::Channel)?;
        debug!(channel_id = channel.id(), "channel opened");
        Ok(Arc::new(AmqpChannel { channel }))
    }

    async fn close(&self) -> SourceResult<()> {
        self.conn
            .close(200, "frog shutting down")
            .await
            .map_err(|e| SourceError::Connect {
                details: format!("close: {e}").into(),
            })
    }
}

// ============================================================================
// Channel
// ============================================================================

pub struct AmqpChannel {
    channel: Channel,
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_exchange(&self, exchange: &str) -> SourceResult<()> {
        self.channel
            .exchange_declare(
                exchange,
                ExchangeKind::Topic,
                exchange_options(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| AmqpSourceError::Declare {
                exchange: exchange.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn declare_queue(&self, queue: &str) -> SourceResult<()> {
        self.channel
            .queue_declare(queue, queue_options(), FieldTable::default())
            .await
            .map_err(|source| AmqpSourceError::QueueSetup {
                queue: queue.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> SourceResult<()> {
        self.channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| AmqpSourceError::QueueSetup {
                queue: queue.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn qos(&self, prefetch: u16) -> SourceResult<()> {
        self.channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(AmqpSourceError::Channel)?;
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        auto_ack: bool,
    ) -> SourceResult<DeliveryStream> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                consume_options(auto_ack),
                FieldTable::default(),
            )
            .await
            .map_err(|source| AmqpSourceError::Consume {
                queue: queue.to_string(),
                source,
            })?;

        let queue = queue.to_string();
        let stream = consumer.map(move |res| match res {
            Ok(d) => {
                let delivery = Delivery::new(Bytes::from(d.data));
                if auto_ack {
                    Ok(delivery)
                } else {
                    Ok(delivery.with_ack(Arc::new(AmqpAck { acker: d.acker })))
                }
            }
            Err(source) => Err(AmqpSourceError::Consume {
                queue: queue.clone(),
                source,
            }
            .into()),
        });

        Ok(stream.boxed())
    }

    async fn delete_queue(&self, queue: &str) -> SourceResult<()> {
        let dropped = self
            .channel
            .queue_delete(queue, delete_options())
            .await
            .map_err(|source| AmqpSourceError::Delete {
                queue: queue.to_string(),
                source,
            })?;
        if dropped > 0 {
            warn!(queue, dropped, "deleted queue still held messages");
        }
        Ok(())
    }
}

// ============================================================================
// Ack
// ============================================================================

struct AmqpAck {
    acker: Acker,
}

#[async_trait]
impl Ack for AmqpAck {
    async fn ack(&self) -> SourceResult<()> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(|e| AmqpSourceError::Ack(e).into())
    }
}
