//! Frog Core Types
//!
//! Shared vocabulary of the drift pipeline: broker targets, the messages the
//! adapter emits, inferred type signatures, evaluation reports, and the
//! traits that sit at the seams between adapter, evaluator and report store.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub mod errors;
pub mod report;
pub mod signature;
pub mod subscription;
pub mod target;

pub use errors::{
    SinkError, SinkResult, SourceError, SourceResult, TargetParseError,
};
pub use report::{DecodeError, Outcome, PayloadSide, Report};
pub use signature::{FieldDiff, ScalarType, TypeSignature, TypeTag, WILDCARD};
pub use subscription::{SubscriptionInfo, SubscriptionState};
pub use target::{QUEUE_PREFIX, Target};

// ============================================================================
// Acknowledgement
// ============================================================================

/// Settles a delivery with the broker.
///
/// Only present on messages consumed in manual-ack mode; with ack-on-receipt
/// the broker has already forgotten the delivery.
#[async_trait]
pub trait Ack: Send + Sync {
    async fn ack(&self) -> SourceResult<()>;
}

pub type AckHandle = Arc<dyn Ack>;

// ============================================================================
// Message
// ============================================================================

/// One delivery, tagged with the target whose queue it arrived on.
#[derive(Clone)]
pub struct Message {
    pub target: Target,
    pub body: Bytes,
    pub ack: Option<AckHandle>,
}

impl Message {
    pub fn new(target: Target, body: impl Into<Bytes>) -> Self {
        Self {
            target,
            body: body.into(),
            ack: None,
        }
    }

    pub fn with_ack(mut self, ack: AckHandle) -> Self {
        self.ack = Some(ack);
        self
    }

    /// Acknowledge the delivery. No-op for auto-acked messages.
    pub async fn ack(&self) -> SourceResult<()> {
        match &self.ack {
            Some(ack) => ack.ack().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("target", &self.target)
            .field("body_len", &self.body.len())
            .field("manual_ack", &self.ack.is_some())
            .finish()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Destination for evaluation reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn id(&self) -> &str;

    async fn store(&self, report: &Report) -> SinkResult<()>;
}

pub type ArcDynReportSink = Arc<dyn ReportSink>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAck(AtomicUsize);

    #[async_trait]
    impl Ack for CountingAck {
        async fn ack(&self) -> SourceResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn message_ack_delegates_to_handle() {
        let target: Target = "orders:created".parse().unwrap();
        let counter = Arc::new(CountingAck(AtomicUsize::new(0)));

        let auto = Message::new(target.clone(), &b"{}"[..]);
        auto.ack().await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        let manual = Message::new(target, &b"{}"[..]).with_ack(counter.clone());
        manual.ack().await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn message_debug_hides_payload() {
        let msg = Message::new("a:b".parse().unwrap(), &b"secret"[..]);
        let dbg = format!("{msg:?}");
        assert!(dbg.contains("body_len: 6"));
        assert!(!dbg.contains("secret"));
    }
}
