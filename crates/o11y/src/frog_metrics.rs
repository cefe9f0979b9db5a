use axum::{Router, routing::get};
use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub enable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { enable: true }
    }
}

/// Install the Prometheus recorder. The snapshot is served by
/// [`router_with_metrics`] on the main HTTP listener.
pub fn init(cfg: &Config) -> Result<(), BuildError> {
    if !cfg.enable {
        return Ok(());
    }

    if HANDLE.get().is_none() {
        let handle = PrometheusBuilder::new().install_recorder()?;
        HANDLE.set(handle).ok();
    }

    describe_metrics();
    Ok(())
}

/// Axum handler that renders the current metrics snapshot.
pub async fn metrics_handler() -> String {
    HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# recorder not installed\n".into())
}

pub fn router_with_metrics() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub fn describe_metrics() {
    describe_counter!(
        "frog_messages_total",
        Unit::Count,
        "Messages evaluated, per target"
    );
    describe_counter!(
        "frog_reports_total",
        Unit::Count,
        "Reports produced, per outcome"
    );
    describe_counter!(
        "frog_drift_fields_total",
        Unit::Count,
        "Drifted fields reported, per target"
    );
    describe_gauge!(
        "frog_subscriptions_active",
        Unit::Count,
        "Subscriptions currently consuming"
    );
    describe_counter!(
        "frog_store_failures_total",
        Unit::Count,
        "Reports the report store rejected"
    );
    describe_histogram!(
        "frog_message_latency_seconds",
        Unit::Seconds,
        "Time to evaluate, store and ack one message"
    );
    describe_counter!(
        "frog_panics_total",
        Unit::Count,
        "Panics captured by the panic hook"
    );
}
