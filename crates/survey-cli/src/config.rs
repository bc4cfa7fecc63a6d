//! Layered configuration for submission and retry settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use survey_spec::RetryPolicy;

/// Project-level file picked up from the working directory.
pub const PROJECT_CONFIG: &str = "survey.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Cbor,
}

/// Where finished submissions go
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub sink: SinkKind,
    /// Target URL for the http sink
    pub endpoint: Option<String>,
    /// Directory for the file sink
    pub output_dir: PathBuf,
    pub encoding: Encoding,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::File,
            endpoint: None,
            output_dir: PathBuf::from("submissions"),
            encoding: Encoding::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Per-attempt limit; unset waits forever
    pub timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
            timeout_ms: Some(30_000),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub submission: SubmissionConfig,
    pub retry: RetryConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Merges, lowest priority first: defaults, `./survey.toml`, the explicit
    /// `--config` file, then `SURVEY_*` variables (`__` separates sections).
    pub fn load(config_path: Option<&Path>) -> Result<AppConfig, figment::Error> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        let project = PathBuf::from(PROJECT_CONFIG);
        if project.exists() {
            figment = figment.merge(Toml::file(&project));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed("SURVEY_").split("__"))
            .extract()
    }
}
