//! Consumption and acknowledgement policy for broker subscriptions.

use serde::{Deserialize, Serialize};

/// When a delivery is acknowledged to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    /// Broker auto-ack. A crash between receipt and evaluation loses the
    /// message (at-most-once).
    OnReceipt,
    /// Ack once the evaluator recorded history and the report was stored.
    /// A crash before that redelivers the message (at-least-once).
    #[default]
    AfterEvaluate,
}

impl AckPolicy {
    /// Whether the broker should consider deliveries settled on receipt.
    #[inline]
    pub fn auto_ack(&self) -> bool {
        matches!(self, AckPolicy::OnReceipt)
    }
}

/// Per-subscription consumption settings.
///
/// ```yaml
/// consume:
///   ack: after_evaluate
///   max_messages: 100      # retire the queue after 100 deliveries
///   channel_capacity: 1
///   prefetch: 1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeCfg {
    #[serde(default)]
    pub ack: AckPolicy,

    /// Retire a subscription (delete its queue) after this many deliveries.
    /// Unset means consume until shutdown.
    #[serde(default)]
    pub max_messages: Option<u64>,

    /// Capacity of the fan-in channel between pumps and the evaluator.
    /// Small values keep backpressure on the broker side.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Unacknowledged deliveries the broker may push per subscription.
    /// Only applies to `after_evaluate`; auto-acked consumers are unbounded.
    #[serde(default = "default_prefetch")]
    pub prefetch: u16,
}

fn default_channel_capacity() -> usize {
    1
}

fn default_prefetch() -> u16 {
    1
}

impl Default for ConsumeCfg {
    fn default() -> Self {
        Self {
            ack: AckPolicy::default(),
            max_messages: None,
            channel_capacity: default_channel_capacity(),
            prefetch: default_prefetch(),
        }
    }
}
