#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use frog_core::{Ack, SourceError, SourceResult};
use futures::StreamExt;
use futures::channel::mpsc as fmpsc;
use parking_lot::Mutex;
use sources::{ArcDynChannel, Broker, BrokerChannel, Delivery, DeliveryStream};
use tokio::sync::Notify;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .compact()
            .try_init();
    });
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

// ============================================================================
// In-memory broker
// ============================================================================

#[derive(Default)]
pub struct FakeState {
    pub exchanges: BTreeSet<String>,
    pub queues: BTreeSet<String>,
    pub bindings: Vec<(String, String, String)>,
    pub consumers: Vec<(String, bool)>,
    pub delete_attempts: Vec<String>,
    pub channels_opened: usize,
    pub closed: bool,
    pub fail_declare: HashSet<String>,
    pub fail_delete: HashSet<String>,
    pub prefetches: Vec<u16>,
    /// When set, exchange declares wait for a notification
    pub declare_gate: Option<Arc<Notify>>,
    feeds: HashMap<String, fmpsc::UnboundedSender<SourceResult<Delivery>>>,
}

#[derive(Clone, Default)]
pub struct FakeBroker {
    pub state: Arc<Mutex<FakeState>>,
    pub acks: Arc<AtomicUsize>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a payload to the consumer of `queue`.
    pub fn publish(&self, queue: &str, body: &'static str) -> bool {
        let state = self.state.lock();
        match state.feeds.get(queue) {
            Some(feed) => feed
                .unbounded_send(Ok(Delivery::new(body.as_bytes())))
                .is_ok(),
            None => false,
        }
    }

    /// Make the consumer of `queue` yield an error.
    pub fn break_consumer(&self, queue: &str) {
        let state = self.state.lock();
        if let Some(feed) = state.feeds.get(queue) {
            let _ = feed.unbounded_send(Err(SourceError::Consume {
                queue: queue.to_string(),
                details: "channel closed by broker".into(),
            }));
        }
    }

    /// End the consumer stream of `queue`, as a broker-side cancel does.
    pub fn end_consumer(&self, queue: &str) {
        self.state.lock().feeds.remove(queue);
    }

    pub fn ack_count(&self) -> usize {
        self.acks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Broker for FakeBroker {
    async fn open_channel(&self) -> SourceResult<ArcDynChannel> {
        self.state.lock().channels_opened += 1;
        Ok(Arc::new(FakeChannel {
            state: self.state.clone(),
            acks: self.acks.clone(),
        }))
    }

    async fn close(&self) -> SourceResult<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

struct FakeChannel {
    state: Arc<Mutex<FakeState>>,
    acks: Arc<AtomicUsize>,
}

#[async_trait]
impl BrokerChannel for FakeChannel {
    async fn declare_exchange(&self, exchange: &str) -> SourceResult<()> {
        let gate = self.state.lock().declare_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if state.fail_declare.contains(exchange) {
            return Err(SourceError::Declare {
                exchange: exchange.to_string(),
                details: "access refused".into(),
            });
        }
        state.exchanges.insert(exchange.to_string());
        Ok(())
    }

    async fn declare_queue(&self, queue: &str) -> SourceResult<()> {
        self.state.lock().queues.insert(queue.to_string());
        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> SourceResult<()> {
        self.state.lock().bindings.push((
            queue.to_string(),
            exchange.to_string(),
            routing_key.to_string(),
        ));
        Ok(())
    }

    async fn qos(&self, prefetch: u16) -> SourceResult<()> {
        self.state.lock().prefetches.push(prefetch);
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        _consumer_tag: &str,
        auto_ack: bool,
    ) -> SourceResult<DeliveryStream> {
        let (tx, rx) = fmpsc::unbounded();
        {
            let mut state = self.state.lock();
            state.feeds.insert(queue.to_string(), tx);
            state.consumers.push((queue.to_string(), auto_ack));
        }

        let acks = self.acks.clone();
        Ok(rx
            .map(move |res| {
                res.map(|d| {
                    if auto_ack {
                        d
                    } else {
                        d.with_ack(Arc::new(CountingAck(acks.clone())))
                    }
                })
            })
            .boxed())
    }

    async fn delete_queue(&self, queue: &str) -> SourceResult<()> {
        let mut state = self.state.lock();
        state.delete_attempts.push(queue.to_string());
        if state.fail_delete.contains(queue) {
            return Err(SourceError::Delete {
                queue: queue.to_string(),
                details: "resource locked".into(),
            });
        }
        state.queues.remove(queue);
        state.feeds.remove(queue);
        Ok(())
    }
}

struct CountingAck(Arc<AtomicUsize>);

#[async_trait]
impl Ack for CountingAck {
    async fn ack(&self) -> SourceResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
