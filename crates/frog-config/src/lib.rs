use std::fs;
use std::path::{Path, PathBuf};

use frog_core::{Target, TargetParseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

mod consume_cfg;

pub use consume_cfg::{AckPolicy, ConsumeCfg};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("expanding environment variables: {0}")]
    Env(String),

    #[error("parsing yaml: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    InvalidTarget(#[from] TargetParseError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration file (`frog.yml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrogConfig {
    /// AMQP connection string
    pub datasource: String,

    /// Targets subscribed at startup, as `<exchange>:<routingKey>`
    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default)]
    pub consume: ConsumeCfg,

    #[serde(default)]
    pub evaluator: EvaluatorCfg,

    #[serde(default)]
    pub storage: StorageCfg,

    #[serde(default)]
    pub http: HttpCfg,

    #[serde(default)]
    pub logging: LoggingCfg,
}

impl FrogConfig {
    /// Parse the configured target strings.
    pub fn targets(&self) -> ConfigResult<Vec<Target>> {
        self.targets
            .iter()
            .map(|t| t.parse::<Target>().map_err(ConfigError::from))
            .collect()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.datasource.trim().is_empty() {
            return Err(ConfigError::Invalid("datasource is empty".into()));
        }
        if self.consume.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "consume.channel_capacity must be at least 1".into(),
            ));
        }
        if self.consume.prefetch == 0 {
            return Err(ConfigError::Invalid(
                "consume.prefetch must be at least 1".into(),
            ));
        }
        if self.consume.max_messages == Some(0) {
            return Err(ConfigError::Invalid(
                "consume.max_messages must be at least 1 when set".into(),
            ));
        }
        self.targets()?;
        Ok(())
    }
}

/// Evaluator behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorCfg {
    /// Emit a `baseline` report for a target's first message instead of
    /// staying silent. The baseline is never compared.
    pub report_baseline: bool,
}

/// Where reports (and optionally history) are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    /// Root of the report tree
    pub path: PathBuf,

    /// Persist history to this file so baselines survive restarts.
    /// In-memory history when unset.
    pub history_file: Option<PathBuf>,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("reports"),
            history_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpCfg {
    pub listen_address: String,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingCfg {
    /// Level or full filter string, e.g. `info,lapin=warn`
    pub level: Option<String>,

    /// JSON lines instead of text
    pub json: bool,
}

/// Parse configuration from a YAML string, expanding `${VAR}` references.
pub fn load_from_str(raw: &str) -> ConfigResult<FrogConfig> {
    let with_env = shellexpand::env(raw)
        .map_err(|e| ConfigError::Env(e.to_string()))?
        .to_string();
    let cfg: FrogConfig = serde_yaml::from_str(&with_env)
        .map_err(|source| ConfigError::Parse { source })?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_path<P: AsRef<Path>>(file_path: P) -> ConfigResult<FrogConfig> {
    let file_path = file_path.as_ref();
    let raw = fs::read_to_string(file_path).map_err(|source| ConfigError::Io {
        path: file_path.display().to_string(),
        source,
    })?;
    let cfg = load_from_str(&raw)?;
    debug!(path = %file_path.display(), targets = cfg.targets.len(), "config loaded");
    Ok(cfg)
}
