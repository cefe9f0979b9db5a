use axum::Router;
mod errors;
mod health;
mod reports;
mod targets;

pub use errors::{TargetAPIError, target_error};
pub use reports::ReportsState;
pub use targets::{AppState, RegisterParams, TargetController};

/// Build core router with health and target registration routes.
pub fn router(state: AppState) -> Router {
    let health = health::router(state.clone());
    let target_mgmt = targets::router(state);

    health.merge(target_mgmt)
}

/// Build router with report browsing on top of the core routes.
pub fn router_with_reports(
    app_state: AppState,
    reports_state: ReportsState,
) -> Router {
    router(app_state).merge(reports::router(reports_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use frog_core::{SourceError, SubscriptionInfo, SubscriptionState, Target};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingController {
        registered: Mutex<Vec<Target>>,
    }

    fn info_for(target: Target) -> SubscriptionInfo {
        SubscriptionInfo {
            queue: target.queue_name(),
            target,
            state: SubscriptionState::Consuming,
            delivered: 0,
        }
    }

    #[async_trait]
    impl TargetController for RecordingController {
        async fn active(&self) -> Vec<SubscriptionInfo> {
            self.registered
                .lock()
                .unwrap()
                .iter()
                .cloned()
                .map(info_for)
                .collect()
        }

        async fn register(
            &self,
            target: Target,
        ) -> Result<SubscriptionInfo, TargetAPIError> {
            self.registered.lock().unwrap().push(target.clone());
            Ok(info_for(target))
        }
    }

    struct BrokenBroker;

    #[async_trait]
    impl TargetController for BrokenBroker {
        async fn active(&self) -> Vec<SubscriptionInfo> {
            vec![]
        }

        async fn register(
            &self,
            target: Target,
        ) -> Result<SubscriptionInfo, TargetAPIError> {
            Err(SourceError::Declare {
                exchange: target.exchange().to_string(),
                details: "ACCESS_REFUSED".into(),
            }
            .into())
        }
    }

    fn app(controller: Arc<dyn TargetController>) -> Router {
        router(AppState { controller })
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap())
            .expect("json body")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_routes_expose_targets() {
        let controller = Arc::new(RecordingController::default());
        controller
            .registered
            .lock()
            .unwrap()
            .push("orders:created".parse().unwrap());
        let app = app(controller);

        let resp = app.clone().oneshot(get("/healthz")).await.unwrap();
        assert_eq!(StatusCode::OK, resp.status());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");

        let ready = app.oneshot(get("/readyz")).await.unwrap();
        assert_eq!(StatusCode::OK, ready.status());
        let payload = json_body(ready).await;
        assert_eq!(payload["status"], json!("ready"));
        assert_eq!(payload["targets"][0]["target"], json!("orders:created"));
    }

    #[tokio::test]
    async fn register_then_list_active() {
        let controller = Arc::new(RecordingController::default());
        let app = app(controller.clone());

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/register?exchange=orders&routingKey=created.*")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, resp.status());
        assert_eq!(
            json_body(resp).await,
            json!({
                "target": "orders:created.*",
                "queue": "frog.orders.created.star",
                "state": "consuming",
                "delivered": 0
            })
        );

        let active = app.oneshot(get("/active")).await.unwrap();
        let payload = json_body(active).await;
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
        assert_eq!(payload[0]["queue"], json!("frog.orders.created.star"));
    }

    #[tokio::test]
    async fn register_validates_params() {
        let controller = Arc::new(RecordingController::default());
        let app = app(controller.clone());

        for uri in [
            "/register",
            "/register?exchange=orders",
            "/register?routingKey=created",
            "/register?exchange=&routingKey=created",
            "/register?exchange=a:b&routingKey=c",
        ] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(StatusCode::BAD_REQUEST, resp.status(), "{uri}");
        }
        assert!(controller.registered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn broker_failures_are_bad_gateway() {
        let app = app(Arc::new(BrokenBroker));

        let resp = app
            .oneshot(get("/register?exchange=orders&routingKey=created"))
            .await
            .unwrap();
        assert_eq!(StatusCode::BAD_GATEWAY, resp.status());
        let text =
            String::from_utf8(to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec())
                .unwrap();
        assert!(text.contains("ACCESS_REFUSED"));
    }
}
