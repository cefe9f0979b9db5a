//! Dynamic broker subscriptions fanned into one message stream.
//!
//! Each target walks `unregistered -> topology_declared -> bound ->
//! consuming -> retired`. A consuming target owns one channel and one pump
//! task; every pump feeds the same bounded `mpsc` channel, so a slow
//! consumer holds deliveries back at the broker.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use frog_config::ConsumeCfg;
use frog_core::{
    Message, SourceError, SourceResult, SubscriptionInfo, SubscriptionState,
    Target,
};
use futures::StreamExt;
use metrics::gauge;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{RwLock as GateLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::{ArcDynBroker, ArcDynChannel, DeliveryStream};

// ============================================================================
// Registry
// ============================================================================

struct Entry {
    target: Target,
    queue: String,
    state: SubscriptionState,
    delivered: Arc<AtomicU64>,
}

impl Entry {
    fn info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            target: self.target.clone(),
            queue: self.queue.clone(),
            state: self.state,
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

type Registry = Arc<RwLock<BTreeMap<Target, Entry>>>;

fn set_state(registry: &Registry, target: &Target, state: SubscriptionState) {
    if let Some(entry) = registry.write().get_mut(target) {
        entry.state = state;
    }
}

/// Receiving ends handed to the orchestrator.
pub struct SourceStreams {
    pub messages: mpsc::Receiver<Message>,
    /// Failures from running pumps (stream errors after consuming started)
    pub errors: mpsc::UnboundedReceiver<SourceError>,
}

/// Queue deletions performed by [`BrokerSource::unsubscribe_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TeardownSummary {
    pub deleted: usize,
    pub failed: usize,
}

// ============================================================================
// Source
// ============================================================================

pub struct BrokerSource {
    broker: ArcDynBroker,
    cfg: ConsumeCfg,
    tx: mpsc::Sender<Message>,
    err_tx: mpsc::UnboundedSender<SourceError>,
    registry: Registry,
    cancel: CancellationToken,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    /// Held shared by in-flight subscribes, exclusively by teardown.
    gate: GateLock<()>,
}

impl BrokerSource {
    /// Build an adapter on an open broker connection.
    ///
    /// Pumps stop when `cancel` fires or [`unsubscribe_all`] runs.
    ///
    /// [`unsubscribe_all`]: BrokerSource::unsubscribe_all
    pub fn new(
        broker: ArcDynBroker,
        cfg: ConsumeCfg,
        cancel: &CancellationToken,
    ) -> (Self, SourceStreams) {
        let (tx, messages) = mpsc::channel(cfg.channel_capacity.max(1));
        let (err_tx, errors) = mpsc::unbounded_channel();

        let source = Self {
            broker,
            cfg,
            tx,
            err_tx,
            registry: Arc::new(RwLock::new(BTreeMap::new())),
            cancel: cancel.child_token(),
            pumps: Mutex::new(Vec::new()),
            gate: GateLock::new(()),
        };
        (source, SourceStreams { messages, errors })
    }

    /// Declare topology for `target` and start consuming it.
    ///
    /// Already registered targets are left alone and their current record
    /// is returned. Any broker failure aborts this target only; nothing is
    /// retried and other subscriptions keep running.
    pub async fn subscribe(&self, target: Target) -> SourceResult<SubscriptionInfo> {
        let _gate = self.gate.read().await;
        if self.cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }

        let queue = target.queue_name();
        {
            let mut registry = self.registry.write();
            if let Some(existing) = registry.get(&target) {
                if existing.state.is_live() {
                    debug!(target = %target, state = %existing.state, "already subscribed");
                    return Ok(existing.info());
                }
            }
            registry.insert(
                target.clone(),
                Entry {
                    target: target.clone(),
                    queue: queue.clone(),
                    state: SubscriptionState::Unregistered,
                    delivered: Arc::new(AtomicU64::new(0)),
                },
            );
        }

        match self.establish(&target, &queue).await {
            Ok(info) => Ok(info),
            Err(e) => {
                self.registry.write().remove(&target);
                warn!(target = %target, queue = %queue, error = %e, kind = e.kind(), "subscribe failed");
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        target: &Target,
        queue: &str,
    ) -> SourceResult<SubscriptionInfo> {
        let channel = self.broker.open_channel().await?;

        channel.declare_exchange(target.exchange()).await?;
        set_state(&self.registry, target, SubscriptionState::TopologyDeclared);

        channel.declare_queue(queue).await?;
        channel
            .bind_queue(queue, target.exchange(), target.routing_key())
            .await?;
        set_state(&self.registry, target, SubscriptionState::Bound);

        let auto_ack = self.cfg.ack.auto_ack();
        if !auto_ack {
            channel.qos(self.cfg.prefetch).await?;
        }
        let stream = channel.consume(queue, queue, auto_ack).await?;

        let (info, delivered) = {
            let mut registry = self.registry.write();
            let entry = registry.get_mut(target).ok_or(SourceError::Cancelled)?;
            entry.state = SubscriptionState::Consuming;
            (entry.info(), entry.delivered.clone())
        };
        gauge!("frog_subscriptions_active").increment(1.0);

        let pump = Pump {
            target: target.clone(),
            queue: queue.to_string(),
            channel,
            stream,
            tx: self.tx.clone(),
            err_tx: self.err_tx.clone(),
            registry: self.registry.clone(),
            delivered,
            max_messages: self.cfg.max_messages,
            cancel: self.cancel.clone(),
        };
        {
            let mut pumps = self.pumps.lock();
            pumps.retain(|h| !h.is_finished());
            pumps.push(tokio::spawn(pump.run()));
        }

        info!(
            target = %target,
            queue = %queue,
            ack = ?self.cfg.ack,
            max_messages = ?self.cfg.max_messages,
            "subscription consuming"
        );
        Ok(info)
    }

    /// Current subscriptions, ordered by target.
    pub fn active(&self) -> Vec<SubscriptionInfo> {
        self.registry.read().values().map(Entry::info).collect()
    }

    pub fn get(&self, target: &Target) -> Option<SubscriptionInfo> {
        self.registry.read().get(target).map(Entry::info)
    }

    /// Stop every pump and delete every queue still owned.
    ///
    /// Best effort: a failed deletion is logged and counted, never retried,
    /// and the remaining queues are still deleted. After this call new
    /// subscriptions are refused.
    pub async fn unsubscribe_all(&self) -> TeardownSummary {
        self.cancel.cancel();
        // wait out subscribes that passed the cancel check
        let _gate = self.gate.write().await;

        let pumps = std::mem::take(&mut *self.pumps.lock());
        for pump in pumps {
            if let Err(e) = pump.await {
                warn!(error = %e, "pump task ended abnormally");
            }
        }

        let owned: Vec<(Target, String)> = self
            .registry
            .read()
            .values()
            .filter(|e| {
                matches!(
                    e.state,
                    SubscriptionState::Bound | SubscriptionState::Consuming
                )
            })
            .map(|e| (e.target.clone(), e.queue.clone()))
            .collect();

        let mut summary = TeardownSummary::default();
        let mut channel: Option<ArcDynChannel> = None;

        for (target, queue) in owned {
            let was_consuming = self
                .get(&target)
                .is_some_and(|i| i.state == SubscriptionState::Consuming);

            // A failed operation may close the channel; open a fresh one.
            if channel.is_none() {
                match self.broker.open_channel().await {
                    Ok(ch) => channel = Some(ch),
                    Err(e) => {
                        warn!(queue = %queue, error = %e, "no channel for queue delete");
                        summary.failed += 1;
                        continue;
                    }
                }
            }
            let Some(ch) = channel.as_ref() else {
                continue;
            };

            match ch.delete_queue(&queue).await {
                Ok(()) => {
                    info!(target = %target, queue = %queue, "queue deleted");
                    summary.deleted += 1;
                    set_state(&self.registry, &target, SubscriptionState::Retired);
                    if was_consuming {
                        gauge!("frog_subscriptions_active").decrement(1.0);
                    }
                }
                Err(e) => {
                    warn!(target = %target, queue = %queue, error = %e, "queue delete failed");
                    summary.failed += 1;
                    channel = None;
                }
            }
        }

        info!(deleted = summary.deleted, failed = summary.failed, "subscriptions torn down");
        summary
    }

    /// Tear down subscriptions, then close the connection.
    pub async fn shutdown(&self) -> SourceResult<TeardownSummary> {
        let summary = self.unsubscribe_all().await;
        self.broker.close().await?;
        Ok(summary)
    }
}

// ============================================================================
// Pump
// ============================================================================

struct Pump {
    target: Target,
    queue: String,
    channel: ArcDynChannel,
    stream: DeliveryStream,
    tx: mpsc::Sender<Message>,
    err_tx: mpsc::UnboundedSender<SourceError>,
    registry: Registry,
    delivered: Arc<AtomicU64>,
    max_messages: Option<u64>,
    cancel: CancellationToken,
}

impl Pump {
    async fn run(mut self) {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.stream.next() => next,
            };

            match next {
                Some(Ok(delivery)) => {
                    let mut msg = Message::new(self.target.clone(), delivery.body);
                    if let Some(ack) = delivery.ack {
                        msg = msg.with_ack(ack);
                    }

                    let sent = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => false,
                        res = self.tx.send(msg) => res.is_ok(),
                    };
                    if !sent {
                        break;
                    }

                    let n = self.delivered.fetch_add(1, Ordering::Relaxed) + 1;
                    if self.max_messages.is_some_and(|max| n >= max) {
                        self.retire(n).await;
                        return;
                    }
                }
                Some(Err(e)) => {
                    error!(target = %self.target, queue = %self.queue, error = %e, "consumer failed");
                    let _ = self.err_tx.send(e);
                    break;
                }
                None => {
                    warn!(target = %self.target, queue = %self.queue, "consumer stream ended");
                    let _ = self.err_tx.send(SourceError::Consume {
                        queue: self.queue.clone(),
                        details: "consumer cancelled by broker".into(),
                    });
                    break;
                }
            }
        }
        debug!(target = %self.target, "pump stopped");
    }

    async fn retire(self, delivered: u64) {
        info!(
            target = %self.target,
            queue = %self.queue,
            delivered,
            "message limit reached, retiring subscription"
        );
        match self.channel.delete_queue(&self.queue).await {
            Ok(()) => set_state(&self.registry, &self.target, SubscriptionState::Retired),
            Err(e) => {
                // left as consuming so teardown tries again
                warn!(target = %self.target, queue = %self.queue, error = %e, "queue delete failed");
                return;
            }
        }
        gauge!("frog_subscriptions_active").decrement(1.0);
    }
}
