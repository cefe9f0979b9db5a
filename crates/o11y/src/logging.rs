use once_cell::sync::OnceCell;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt,
};

static INIT: OnceCell<()> = OnceCell::new();

#[derive(Clone, Debug)]
pub struct Config {
    /// Either a simple level like "info" or a full EnvFilter string
    /// e.g. "info,frog=debug,lapin=warn".
    pub level: Option<String>,
    /// Emit logs as JSON lines when true; otherwise text.
    pub json: bool,
    /// Include the event target (module path) in each line.
    pub with_targets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Some("info".to_owned()),
            json: false,
            with_targets: false,
        }
    }
}

/// Build the filter: `RUST_LOG` wins over the configured level.
fn build_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    INIT.get_or_try_init(|| -> Result<(), Box<dyn std::error::Error>> {
        let _ = LogTracer::init();

        let filter = build_filter(cfg.level.as_deref());

        let fmt_layer = if cfg.json {
            fmt::layer()
                .with_target(cfg.with_targets)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .boxed()
        } else {
            fmt::layer()
                .with_target(cfg.with_targets)
                .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stdout()))
                .boxed()
        };

        let subscriber = Registry::default().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    })?;
    Ok(())
}
