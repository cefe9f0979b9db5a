use axum::{Json, Router, extract::State, routing::get};
use frog_core::SubscriptionInfo;
use serde::Serialize;

use crate::targets::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct ReadyStatus {
    status: &'static str,
    targets: Vec<SubscriptionInfo>,
}

async fn readyz(State(st): State<AppState>) -> Json<ReadyStatus> {
    let targets = st.controller.active().await;
    Json(ReadyStatus {
        status: "ready",
        targets,
    })
}
