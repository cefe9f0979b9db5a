//! Per-target drift evaluation.

use std::sync::Arc;

use bytes::Bytes;
use frog_config::EvaluatorCfg;
use frog_core::{Outcome, PayloadSide, Report, Target, TypeSignature};
use history::HistoryStore;
use metrics::counter;
use tracing::{debug, warn};

use crate::diff::diff;
use crate::errors::EvaluateResult;
use crate::signature::infer_bytes;

/// Compares each message with the previous message of the same target.
///
/// History holds exactly one payload per target: every call replaces it,
/// so the comparison is always against the immediately preceding message,
/// not the first one ever seen.
pub struct DriftEvaluator {
    history: Arc<dyn HistoryStore>,
    config: EvaluatorCfg,
}

impl DriftEvaluator {
    pub fn new(history: Arc<dyn HistoryStore>, config: EvaluatorCfg) -> Self {
        Self { history, config }
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Evaluate `body` for `target`.
    ///
    /// Returns `None` for a target's first message unless baseline reports
    /// are enabled. History is swapped before inference, so it is updated
    /// even when either payload fails to decode. No lock is held while
    /// inferring or diffing.
    pub async fn evaluate(
        &self,
        target: &Target,
        body: Bytes,
    ) -> EvaluateResult<Option<Report>> {
        let key = target.to_string();
        counter!("frog_messages_total", "target" => key.clone()).increment(1);

        let previous = self.history.swap_raw(&key, body.clone()).await?;

        let Some(previous) = previous else {
            debug!(target = %target, "first message, baseline recorded");
            if !self.config.report_baseline {
                return Ok(None);
            }
            let signature = infer_bytes(&body).ok();
            return Ok(Some(self.finish(target, body, signature, Outcome::Baseline)));
        };

        let current = match infer_bytes(&body) {
            Ok(sig) => sig,
            Err(e) => {
                warn!(target = %target, error = %e, "undecodable payload");
                return Ok(Some(self.finish(
                    target,
                    body,
                    None,
                    Outcome::DecodeError(e),
                )));
            }
        };

        let prior = match infer_bytes(&previous) {
            Ok(sig) => sig,
            Err(e) => {
                let e = e.with_side(PayloadSide::Previous);
                debug!(target = %target, error = %e, "previous payload was undecodable");
                return Ok(Some(self.finish(
                    target,
                    body,
                    Some(current),
                    Outcome::DecodeError(e),
                )));
            }
        };

        let diffs = diff(&prior, &current);
        debug!(
            target = %target,
            fields = current.leaf_count(),
            drifted = diffs.len(),
            "payload compared"
        );
        let outcome = if diffs.is_empty() {
            Outcome::Match
        } else {
            counter!("frog_drift_fields_total", "target" => key.clone())
                .increment(diffs.len() as u64);
            for d in &diffs {
                warn!(
                    target = %target,
                    path = %d.path,
                    was = %d.side_a,
                    now = %d.side_b,
                    "schema drift"
                );
            }
            Outcome::Diff(diffs)
        };

        Ok(Some(self.finish(target, body, Some(current), outcome)))
    }

    fn finish(
        &self,
        target: &Target,
        body: Bytes,
        signature: Option<TypeSignature>,
        outcome: Outcome,
    ) -> Report {
        counter!("frog_reports_total", "outcome" => outcome.as_str()).increment(1);
        Report::new(target.clone(), body, signature, outcome)
    }
}
