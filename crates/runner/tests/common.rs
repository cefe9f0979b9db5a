#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use frog_core::{Ack, Report, ReportSink, SinkError, SinkResult, SourceResult};
use sources::{ArcDynChannel, Broker, BrokerChannel, DeliveryStream};
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

// ============================================================================
// Report sink
// ============================================================================

/// Keeps every stored report; can be switched to reject writes.
#[derive(Default)]
pub struct RecordingSink {
    pub reports: Mutex<Vec<Report>>,
    pub reject: AtomicBool,
}

impl RecordingSink {
    pub fn outcomes(&self) -> Vec<&'static str> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.outcome.as_str())
            .collect()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    fn id(&self) -> &str {
        "recording"
    }

    async fn store(&self, report: &Report) -> SinkResult<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SinkError::Io(std::io::Error::other("disk full")));
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingAck(pub AtomicUsize);

impl CountingAck {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ack for CountingAck {
    async fn ack(&self) -> SourceResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Broker that accepts topology and never delivers
// ============================================================================

#[derive(Default)]
pub struct IdleState {
    pub declared: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[derive(Default, Clone)]
pub struct IdleBroker {
    pub state: Arc<IdleState>,
}

struct IdleChannel(Arc<IdleState>);

#[async_trait]
impl Broker for IdleBroker {
    async fn open_channel(&self) -> SourceResult<ArcDynChannel> {
        Ok(Arc::new(IdleChannel(self.state.clone())))
    }

    async fn close(&self) -> SourceResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BrokerChannel for IdleChannel {
    async fn declare_exchange(&self, _exchange: &str) -> SourceResult<()> {
        Ok(())
    }

    async fn declare_queue(&self, queue: &str) -> SourceResult<()> {
        self.0.declared.lock().unwrap().push(queue.to_string());
        Ok(())
    }

    async fn bind_queue(
        &self,
        _queue: &str,
        _exchange: &str,
        _routing_key: &str,
    ) -> SourceResult<()> {
        Ok(())
    }

    async fn qos(&self, _prefetch: u16) -> SourceResult<()> {
        Ok(())
    }

    async fn consume(
        &self,
        _queue: &str,
        _consumer_tag: &str,
        _auto_ack: bool,
    ) -> SourceResult<DeliveryStream> {
        Ok(Box::pin(futures::stream::pending()))
    }

    async fn delete_queue(&self, queue: &str) -> SourceResult<()> {
        self.0.deleted.lock().unwrap().push(queue.to_string());
        Ok(())
    }
}
