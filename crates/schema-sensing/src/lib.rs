//! Schema Sensing - structural type inference and drift detection.
//!
//! Turns JSON payloads into type signatures and compares each message of a
//! target with the one before it.
//!
//! # Example
//!
//! ```ignore
//! use schema_sensing::{DriftEvaluator, EvaluatorCfg};
//! use history::MemHistoryStore;
//!
//! let evaluator = DriftEvaluator::new(Arc::new(MemHistoryStore::new()), EvaluatorCfg::default());
//!
//! let target = "users:updated".parse()?;
//! evaluator.evaluate(&target, r#"{"name": "frog"}"#.into()).await?;   // None, baseline
//! let report = evaluator.evaluate(&target, r#"{"name": 1}"#.into()).await?;
//! // report.outcome == Outcome::Diff([.name: string -> number])
//! ```

mod diff;
mod errors;
mod evaluator;
mod signature;

pub use diff::diff;
pub use errors::{EvaluateError, EvaluateResult};
pub use evaluator::DriftEvaluator;
pub use signature::{infer, infer_bytes};

pub use frog_config::EvaluatorCfg;
