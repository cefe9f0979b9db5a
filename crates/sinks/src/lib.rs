//! Report sinks for frog.
//!
//! Every sink implements `ReportSink` from `frog_core`. The file store keeps
//! the latest report of each target in its own directory, which the HTTP API
//! serves back for browsing.

pub mod file;

pub use file::FileReportStore;
