use std::sync::Arc;

use async_trait::async_trait;
use frog_core::{SubscriptionInfo, Target};
use rest_api::{TargetAPIError, TargetController};
use sources::BrokerSource;
use tracing::info;

/// Exposes the running [`BrokerSource`] to the HTTP API.
#[derive(Clone)]
pub struct SourceController {
    source: Arc<BrokerSource>,
}

impl SourceController {
    pub fn new(source: Arc<BrokerSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl TargetController for SourceController {
    async fn active(&self) -> Vec<SubscriptionInfo> {
        self.source.active()
    }

    async fn register(
        &self,
        target: Target,
    ) -> Result<SubscriptionInfo, TargetAPIError> {
        info!(target = %target, "runtime registration");
        Ok(self.source.subscribe(target).await?)
    }
}
