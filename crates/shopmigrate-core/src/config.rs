//! Migration configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::impls::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Delete target shops that occupy a migrating coordinate.
    pub override_existing: bool,

    /// Host data folder holding the legacy system's directory.
    pub data_folder: PathBuf,

    /// Name of the legacy system's directory inside `data_folder`.
    pub legacy_dir_name: String,

    /// Appended to `legacy_dir_name` when the directory is moved aside.
    pub migrated_suffix: String,

    /// Upper bound on concurrently running extraction tasks.
    pub max_parallel: usize,

    /// Origin tag written on every migrated shop.
    pub plugin_origin: String,

    pub flush_retry: FlushRetryConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            override_existing: false,
            data_folder: PathBuf::from("plugins"),
            legacy_dir_name: "QuickShop".to_string(),
            migrated_suffix: ".migrated".to_string(),
            max_parallel: 4,
            plugin_origin: "QuickShop-Hikari".to_string(),
            flush_retry: FlushRetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlushRetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for FlushRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            multiplier: 2.0,
        }
    }
}

impl FlushRetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: self.multiplier,
            max_attempts: self.max_attempts,
        }
    }
}

impl MigrationConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: MigrationConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel == 0 {
            return Err(ConfigError::Invalid("max_parallel must be at least 1".into()));
        }
        if self.flush_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "flush_retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.legacy_dir_name.is_empty() || self.migrated_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "legacy_dir_name and migrated_suffix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Where the legacy data directory lives now.
    pub fn legacy_dir(&self) -> PathBuf {
        self.data_folder.join(&self.legacy_dir_name)
    }

    /// Where it is moved during commit.
    pub fn migrated_dir(&self) -> PathBuf {
        self.data_folder
            .join(format!("{}{}", self.legacy_dir_name, self.migrated_suffix))
    }
}
