use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use frog_core::{SubscriptionInfo, Target};
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::{TargetAPIError, target_error};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<dyn TargetController>,
}

#[async_trait]
pub trait TargetController: Send + Sync {
    /// Subscriptions known to the adapter.
    async fn active(&self) -> Vec<SubscriptionInfo>;

    /// Subscribe `target` at runtime. Registering a live target again
    /// returns its existing record.
    async fn register(
        &self,
        target: Target,
    ) -> Result<SubscriptionInfo, TargetAPIError>;
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/active", get(list_active))
        .route("/register", get(register).post(register))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    exchange: Option<String>,
    #[serde(rename = "routingKey")]
    routing_key: Option<String>,
}

async fn list_active(State(st): State<AppState>) -> Json<Vec<SubscriptionInfo>> {
    Json(st.controller.active().await)
}

async fn register(
    State(st): State<AppState>,
    Query(params): Query<RegisterParams>,
) -> Result<Json<SubscriptionInfo>, (StatusCode, String)> {
    let exchange = non_empty(params.exchange)
        .ok_or(TargetAPIError::MissingParam("exchange"))
        .map_err(target_error)?;
    let routing_key = non_empty(params.routing_key)
        .ok_or(TargetAPIError::MissingParam("routingKey"))
        .map_err(target_error)?;

    let target = Target::new(exchange, routing_key)
        .map_err(|e| target_error(e.into()))?;

    st.controller
        .register(target)
        .await
        .map(Json)
        .map_err(target_error)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
