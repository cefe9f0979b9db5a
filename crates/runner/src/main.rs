use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use frog_config::FrogConfig;
use frog_core::ArcDynReportSink;
use history::{FileHistoryStore, HistoryStore, MemHistoryStore};
use rest_api::{AppState, ReportsState, router_with_reports};
use runner::{Coordinator, SourceController, version};
use schema_sensing::DriftEvaluator;
use sinks::FileReportStore;
use sources::BrokerSource;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "frog", version = version::VERSION, about = "Schema drift detection for AMQP topic exchanges")]
struct Args {
    #[arg(short = 'c', long, default_value = "frog.yml")]
    config_file: PathBuf,

    /// Overrides `storage.path`
    #[arg(short = 'o', long)]
    storage_path: Option<PathBuf>,

    /// Overrides `http.listen_address`
    #[arg(short = 'p', long)]
    listen_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = frog_config::load_from_path(&args.config_file)
        .with_context(|| format!("load config {}", args.config_file.display()))?;
    if let Some(path) = args.storage_path {
        cfg.storage.path = path;
    }
    if let Some(addr) = args.listen_address {
        cfg.http.listen_address = addr;
    }

    let o11y_cfg = o11y::O11yConfig {
        logging: o11y::logging::Config {
            level: cfg.logging.level.clone(),
            json: cfg.logging.json,
            with_targets: false,
        },
        ..Default::default()
    };
    o11y::init_all(&o11y_cfg).map_err(|e| anyhow!("init observability: {e}"))?;

    info!(version = version::VERSION, "frog starting");

    let res = run(cfg).await;
    if let Err(ref e) = res {
        error!(error = %format!("{e:#}"), "frog exited with error");
    }
    res
}

async fn run(cfg: FrogConfig) -> Result<()> {
    let targets = cfg.targets()?;
    let addr: SocketAddr = cfg
        .http
        .listen_address
        .parse()
        .with_context(|| format!("listen address {}", cfg.http.listen_address))?;

    let history: Arc<dyn HistoryStore> = match &cfg.storage.history_file {
        Some(path) => Arc::new(
            FileHistoryStore::new(path)
                .with_context(|| format!("open history {}", path.display()))?,
        ),
        None => Arc::new(MemHistoryStore::new()),
    };
    let restored = history.list().await.context("read history")?;
    if !restored.is_empty() {
        info!(targets = restored.len(), "baselines restored");
    }
    let evaluator = DriftEvaluator::new(history, cfg.evaluator.clone());
    let sink: ArcDynReportSink = Arc::new(FileReportStore::new(&cfg.storage.path));
    info!(path = %cfg.storage.path.display(), "report store ready");

    let cancel = CancellationToken::new();
    let broker = sources::connect_broker(&cfg.datasource)
        .await
        .context("connect to broker")?;
    let (source, streams) = BrokerSource::new(broker, cfg.consume.clone(), &cancel);
    let source = Arc::new(source);

    for target in targets {
        if let Err(e) = source.subscribe(target.clone()).await {
            teardown(&source).await;
            return Err(anyhow!(e).context(format!("subscribe {target}")));
        }
    }

    let app = router_with_reports(
        AppState {
            controller: Arc::new(SourceController::new(source.clone())),
        },
        ReportsState {
            root: cfg.storage.path.clone(),
        },
    )
    .merge(o11y::frog_metrics::router_with_metrics());

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            teardown(&source).await;
            return Err(anyhow!(e).context(format!("bind {addr}")));
        }
    };
    info!(%addr, "api listening");
    let api_task = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.clone().cancelled_owned())
            .into_future(),
    );

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_cancel.cancel();
    });

    let coordinator = Coordinator::new(evaluator, sink);
    let res = coordinator
        .run(streams.messages, streams.errors, cancel.clone())
        .await;

    cancel.cancel();
    teardown(&source).await;

    match api_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "api server error"),
        Err(e) => warn!(error = %e, "api task ended abnormally"),
    }

    res.map(|_| ())
}

async fn teardown(source: &BrokerSource) {
    match source.shutdown().await {
        Ok(summary) => info!(
            deleted = summary.deleted,
            failed = summary.failed,
            "broker connection closed"
        ),
        Err(e) => warn!(error = %e, "broker close failed"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
