//! Shared utilities for the frog crates.
//!
//! - **DSN Utilities**: AMQP connection string parsing and credential redaction
//! - **Path Utilities**: on-disk naming of report trees and traversal-safe joins

pub mod dsn;
pub mod paths;

// =============================================================================
// DSN Utilities
// =============================================================================

pub use dsn::{AmqpEndpoint, redact_dsn};

// =============================================================================
// Path Utilities
// =============================================================================

pub use paths::{diff_file_name, join_within, target_dir_name};
