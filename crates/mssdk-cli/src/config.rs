//! # CLI Configuration
//!
//! Settings come from three layers, later ones winning: an optional YAML
//! file (`--config`), `MSSDK_*` environment variables, then command-line
//! flags applied by `main`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use mssdk_extract::GitExtractor;
use mssdk_pack::BulkOptions;

pub const ENV_LOG_FORMAT: &str = "MSSDK_LOG_FORMAT";
pub const ENV_WORKERS: &str = "MSSDK_WORKERS";
pub const ENV_GIT_TIMEOUT_SECS: &str = "MSSDK_GIT_TIMEOUT_SECS";
pub const ENV_GIT_BINARY: &str = "MSSDK_GIT_BINARY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("unknown log format {other:?}, expected text or json"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SdkConfig {
    pub log_format: LogFormat,
    /// Bulk validation workers; unset uses the available parallelism.
    pub workers: Option<usize>,
    pub git_timeout_secs: Option<u64>,
    pub git_binary: Option<PathBuf>,
}

impl SdkConfig {
    /// Read `path` if given, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from `lookup`, which maps variable names to values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            self.log_format = value
                .parse()
                .with_context(|| format!("invalid {ENV_LOG_FORMAT}"))?;
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            let workers: usize = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WORKERS} must be a positive integer"))?;
            if workers == 0 {
                bail!("{ENV_WORKERS} must be at least 1");
            }
            self.workers = Some(workers);
        }
        if let Some(value) = lookup(ENV_GIT_TIMEOUT_SECS) {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_GIT_TIMEOUT_SECS} must be a number of seconds"))?;
            self.git_timeout_secs = Some(secs);
        }
        if let Some(value) = lookup(ENV_GIT_BINARY) {
            self.git_binary = Some(PathBuf::from(value));
        }
        Ok(())
    }

    pub fn git_extractor(&self) -> GitExtractor {
        let mut extractor = GitExtractor::new();
        if let Some(binary) = &self.git_binary {
            extractor = extractor.with_git_binary(binary.clone());
        }
        if let Some(secs) = self.git_timeout_secs {
            extractor = extractor.with_timeout(Duration::from_secs(secs));
        }
        extractor
    }

    pub fn bulk_options(&self, update_hash: bool) -> BulkOptions {
        BulkOptions {
            workers: self.workers,
            update_hash,
        }
    }
}
