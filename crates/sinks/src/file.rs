//! Report tree on the local filesystem.
//!
//! ```text
//! <root>/
//!   orders_created.*/
//!     body.json          raw payload of the latest evaluated message
//!     schema.json        inferred signature, when the payload decoded
//!     report.json        the full report: target, signature, outcome, timestamp
//!     errors/
//!       customer.email.json   one file per drifted field
//! ```
//!
//! `errors/` always mirrors the latest report: it is cleared before each
//! write and stays empty unless the outcome is a diff.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::{diff_file_name, target_dir_name};
use frog_core::{Report, ReportSink, SinkResult};
use tracing::debug;

pub const BODY_FILE: &str = "body.json";
pub const SCHEMA_FILE: &str = "schema.json";
pub const REPORT_FILE: &str = "report.json";
pub const ERRORS_DIR: &str = "errors";

pub struct FileReportStore {
    id: String,
    root: PathBuf,
}

impl FileReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            id: "file".to_string(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a target's latest report.
    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.root.join(target_dir_name(target))
    }
}

#[async_trait]
impl ReportSink for FileReportStore {
    fn id(&self) -> &str {
        &self.id
    }

    async fn store(&self, report: &Report) -> SinkResult<()> {
        let dir = self.target_dir(&report.target.to_string());
        let errors = dir.join(ERRORS_DIR);

        tokio::fs::create_dir_all(&dir).await?;
        if tokio::fs::try_exists(&errors).await? {
            tokio::fs::remove_dir_all(&errors).await?;
        }

        write_atomic(&dir.join(BODY_FILE), &report.body).await?;

        let schema = dir.join(SCHEMA_FILE);
        match &report.signature {
            Some(sig) => {
                write_atomic(&schema, &serde_json::to_vec_pretty(sig)?).await?
            }
            None => {
                if tokio::fs::try_exists(&schema).await? {
                    tokio::fs::remove_file(&schema).await?;
                }
            }
        }

        write_atomic(&dir.join(REPORT_FILE), &serde_json::to_vec_pretty(report)?)
            .await?;

        let diffs = report.diffs();
        if !diffs.is_empty() {
            tokio::fs::create_dir_all(&errors).await?;
            for d in diffs {
                let path = errors.join(diff_file_name(&d.path));
                write_atomic(&path, &serde_json::to_vec_pretty(d)?).await?;
            }
        }

        debug!(
            target = %report.target,
            outcome = report.outcome.as_str(),
            dir = %dir.display(),
            "report stored"
        );
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}
