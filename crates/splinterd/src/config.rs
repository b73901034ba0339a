//! TOML configuration for the splinterd CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use splinter_store::RetryPolicy;
use splinter_types::EngineConfig;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Fragment and metadata storage locations, plus retry tuning.
    pub storage: StorageSection,
    /// Ingest pipeline tuning.
    pub ingest: IngestSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for persistent data (metadata DB, fragment files).
    pub data_dir: PathBuf,
    /// Attempts per backend call before a transient error becomes permanent.
    pub retry_attempts: Option<u32>,
    /// Base delay for exponential retry backoff, in milliseconds.
    pub retry_base_delay_ms: Option<u64>,
}

impl Default for StorageSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".splinter"))
            .unwrap_or_else(|| PathBuf::from(".splinter"));
        Self {
            data_dir,
            retry_attempts: None,
            retry_base_delay_ms: None,
        }
    }
}

/// `[ingest]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Fragment size in bytes. Defaults to 1 MiB.
    pub chunk_size: Option<u32>,
    /// Concurrent fragment reads/writes per operation.
    pub max_concurrent_io: Option<usize>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Build the validated engine configuration.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            chunk_size: self.ingest.chunk_size.unwrap_or(defaults.chunk_size),
            max_concurrent_io: self
                .ingest
                .max_concurrent_io
                .unwrap_or(defaults.max_concurrent_io),
        };
        anyhow::ensure!(config.chunk_size > 0, "ingest.chunk_size must be positive");
        anyhow::ensure!(
            config.max_concurrent_io > 0,
            "ingest.max_concurrent_io must be positive"
        );
        Ok(config)
    }

    /// Retry policy for the fragment store boundary.
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            attempts: self.storage.retry_attempts.unwrap_or(defaults.attempts),
            base_delay: self
                .storage
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
        }
    }
}
