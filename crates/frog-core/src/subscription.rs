use std::fmt;

use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Lifecycle of a target's broker subscription.
///
/// A record is stored as `Unregistered` while its first subscribe is still
/// in flight; a target without a record is unregistered as well. States
/// only move forward; a retired subscription can be registered again,
/// which starts a fresh record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Unregistered,
    /// Exchange exists (durable, topic)
    TopologyDeclared,
    /// Queue exists and is bound under the routing key
    Bound,
    /// A pump is forwarding deliveries
    Consuming,
    /// Queue deleted, pump stopped
    Retired,
}

impl SubscriptionState {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Unregistered => "unregistered",
            SubscriptionState::TopologyDeclared => "topology_declared",
            SubscriptionState::Bound => "bound",
            SubscriptionState::Consuming => "consuming",
            SubscriptionState::Retired => "retired",
        }
    }

    /// Registering the target again would do nothing: either a subscribe
    /// is in flight or the subscription already holds a queue.
    #[inline]
    pub fn is_live(&self) -> bool {
        !matches!(self, SubscriptionState::Retired)
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one subscription, as listed by `/active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub target: Target,
    pub queue: String,
    pub state: SubscriptionState,
    pub delivered: u64,
}
