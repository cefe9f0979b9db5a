use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::TargetParseError;

/// Prefix of every queue the adapter declares.
pub const QUEUE_PREFIX: &str = "frog";

/// An exchange plus a routing-key pattern, written `<exchange>:<routingKey>`.
///
/// Immutable once built. The routing key may carry topic wildcards (`*`, `#`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    exchange: String,
    routing_key: String,
}

impl Target {
    pub fn new(
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Result<Self, TargetParseError> {
        let exchange = exchange.into();
        let routing_key = routing_key.into();
        let input = format!("{exchange}:{routing_key}");

        if exchange.is_empty() {
            return Err(TargetParseError {
                input,
                reason: "exchange is empty",
            });
        }
        if routing_key.is_empty() {
            return Err(TargetParseError {
                input,
                reason: "routing key is empty",
            });
        }
        if exchange.contains(':') || routing_key.contains(':') {
            return Err(TargetParseError {
                input,
                reason: "expected exactly one ':' separator",
            });
        }

        Ok(Self {
            exchange,
            routing_key,
        })
    }

    #[inline]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    #[inline]
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Deterministic queue name: `frog.<exchange>.<routingKey>` with every
    /// `*` spelled `star`, so re-registering a target reuses its queue.
    pub fn queue_name(&self) -> String {
        format!(
            "{}.{}.{}",
            QUEUE_PREFIX,
            self.exchange,
            self.routing_key.replace('*', "star")
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.routing_key)
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(exchange), Some(routing_key), None) => {
                Target::new(exchange, routing_key)
            }
            _ => Err(TargetParseError {
                input: s.to_string(),
                reason: "expected exactly one ':' separator",
            }),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exchange_and_routing_key() {
        let t: Target = "orders:created.*".parse().unwrap();
        assert_eq!(t.exchange(), "orders");
        assert_eq!(t.routing_key(), "created.*");
        assert_eq!(t.to_string(), "orders:created.*");
    }

    #[test]
    fn queue_name_replaces_every_star() {
        let t = Target::new("orders", "created.*").unwrap();
        assert_eq!(t.queue_name(), "frog.orders.created.star");

        let t = Target::new("audit", "*.*.#").unwrap();
        assert_eq!(t.queue_name(), "frog.audit.star.star.#");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!("orders".parse::<Target>().is_err());
        assert!("orders:created:extra".parse::<Target>().is_err());
        assert!(":created".parse::<Target>().is_err());
        assert!("orders:".parse::<Target>().is_err());
    }

    #[test]
    fn serde_uses_the_string_form() {
        let t: Target = "billing:invoice.paid".parse().unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#""billing:invoice.paid""#);

        let back: Target = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);

        assert!(serde_json::from_str::<Target>(r#""nope""#).is_err());
    }
}
