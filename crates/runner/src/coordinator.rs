//! Orchestrator loop: evaluate each message, store its report, then ack.

use anyhow::{Result, anyhow};
use frog_core::{ArcDynReportSink, Message, SourceError};
use metrics::{counter, histogram};
use schema_sensing::DriftEvaluator;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// A report was stored; carries the outcome kind.
    Reported(&'static str),
    /// First message for its target, nothing to report.
    Silent,
    /// Evaluation, storage or ack failed. The message stays unacked.
    Failed,
}

/// Counters returned when the loop exits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub reported: u64,
    pub failed: u64,
}

pub struct Coordinator {
    evaluator: DriftEvaluator,
    sink: ArcDynReportSink,
}

impl Coordinator {
    pub fn new(evaluator: DriftEvaluator, sink: ArcDynReportSink) -> Self {
        Self { evaluator, sink }
    }

    /// Evaluate, store, ack.
    ///
    /// The ack happens only after the history swap and the report store
    /// both succeeded. Messages consumed with ack-on-receipt carry no ack
    /// handle and are unaffected.
    pub async fn handle(&self, msg: Message) -> Handled {
        let start = Instant::now();

        let report = match self.evaluator.evaluate(&msg.target, msg.body.clone()).await {
            Ok(report) => report,
            Err(e) => {
                error!(target = %msg.target, error = %e, "evaluation failed");
                return Handled::Failed;
            }
        };

        let handled = match report {
            None => Handled::Silent,
            Some(report) => {
                if let Err(e) = self.sink.store(&report).await {
                    counter!("frog_store_failures_total", "sink" => self.sink.id().to_string())
                        .increment(1);
                    error!(
                        target = %msg.target,
                        sink = self.sink.id(),
                        error = %e,
                        "report store failed"
                    );
                    return Handled::Failed;
                }
                debug!(target = %msg.target, outcome = report.outcome.as_str(), "report stored");
                Handled::Reported(report.outcome.as_str())
            }
        };

        if let Err(e) = msg.ack().await {
            warn!(target = %msg.target, error = %e, "ack failed");
            return Handled::Failed;
        }

        histogram!("frog_message_latency_seconds").record(start.elapsed().as_secs_f64());
        handled
    }

    /// Drain `messages` one at a time until cancelled or the stream ends.
    ///
    /// A failure reported on `errors` is fatal: the loop stops and the error
    /// is returned so the process can exit non-zero.
    pub async fn run(
        self,
        mut messages: mpsc::Receiver<Message>,
        mut errors: mpsc::UnboundedReceiver<SourceError>,
        cancel: CancellationToken,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut errors_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("coordinator cancelled");
                    break;
                }

                err = errors.recv(), if errors_open => {
                    match err {
                        Some(e) => {
                            error!(error = %e, kind = e.kind(), "subscription failed");
                            return Err(anyhow!(e).context("broker subscription failed"));
                        }
                        None => errors_open = false,
                    }
                }

                msg = messages.recv() => {
                    let Some(msg) = msg else {
                        info!("message stream closed");
                        break;
                    };

                    stats.processed += 1;
                    match self.handle(msg).await {
                        Handled::Reported(_) => stats.reported += 1,
                        Handled::Silent => {}
                        Handled::Failed => stats.failed += 1,
                    }
                }
            }
        }

        info!(
            processed = stats.processed,
            reported = stats.reported,
            failed = stats.failed,
            "coordinator exited"
        );
        Ok(stats)
    }
}
