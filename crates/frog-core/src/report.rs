use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signature::{FieldDiff, TypeSignature};
use crate::target::Target;

// ============================================================================
// Decode Errors
// ============================================================================

/// Which of the two compared payloads a decode failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSide {
    Previous,
    Current,
}

impl fmt::Display for PayloadSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSide::Previous => f.write_str("previous"),
            PayloadSide::Current => f.write_str("current"),
        }
    }
}

/// A payload that is not valid JSON.
///
/// Keeps the offending bytes so the report can show exactly what arrived.
/// The bytes are not serialized; reports carry the body separately.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{side} payload is not valid JSON at line {line} column {column}: {message}")]
pub struct DecodeError {
    pub side: PayloadSide,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl DecodeError {
    pub fn from_json(err: &serde_json::Error, bytes: Bytes) -> Self {
        Self {
            side: PayloadSide::Current,
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
            bytes,
        }
    }

    pub fn with_side(mut self, side: PayloadSide) -> Self {
        self.side = side;
        self
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// What evaluating one message against its predecessor produced.
///
/// Drift is an outcome, not an error: `Diff` sits next to `Match` and is
/// never folded into `DecodeError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// First message for the target; nothing to compare against.
    Baseline,
    Match,
    DecodeError(DecodeError),
    Diff(Vec<FieldDiff>),
}

impl Outcome {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Baseline => "baseline",
            Outcome::Match => "match",
            Outcome::DecodeError(_) => "decode_error",
            Outcome::Diff(_) => "diff",
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Result of evaluating one message, handed to the report store.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub target: Target,

    /// Raw payload exactly as received
    #[serde(skip)]
    pub body: Bytes,

    /// Signature of `body`, when it decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<TypeSignature>,

    pub outcome: Outcome,

    pub observed_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        target: Target,
        body: Bytes,
        signature: Option<TypeSignature>,
        outcome: Outcome,
    ) -> Self {
        Self {
            target,
            body,
            signature,
            outcome,
            observed_at: Utc::now(),
        }
    }

    /// Field diffs, empty unless the outcome is `Diff`.
    pub fn diffs(&self) -> &[FieldDiff] {
        match &self.outcome {
            Outcome::Diff(d) => d,
            _ => &[],
        }
    }
}
