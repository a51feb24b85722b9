//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use lapline_core::RetryPolicy;
use serde::Deserialize;

/// Global configuration for lapline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub fetch: FetchDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("./data/raw"),
            output_dir: PathBuf::from("./data/intermediate"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub envelope: String,
    pub page_size: u64,
    pub fallback_offset_cap: u64,
    pub page_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let defaults = lapline_fetch::FetchConfig::default();
        Self {
            base_url: defaults.base_url,
            envelope: defaults.envelope,
            page_size: defaults.page_size,
            fallback_offset_cap: defaults.fallback_offset_cap,
            page_delay_ms: defaults.page_delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            backoff_secs: policy.backoff.as_secs(),
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(c: RetryConfig) -> Self {
        Self {
            max_retries: c.max_retries,
            backoff: Duration::from_secs(c.backoff_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchDefaults {
    pub seasons: Vec<i32>,
}

impl Default for FetchDefaults {
    fn default() -> Self {
        Self {
            seasons: lapline_fetch::config::DEFAULT_SEASONS.to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./lapline.toml (current directory)
    /// 2. ~/.config/lapline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("lapline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "lapline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Fetch pipeline settings; `raw_dir` may be overridden per command
    pub fn fetch_config(&self, raw_dir: Option<PathBuf>) -> lapline_fetch::FetchConfig {
        lapline_fetch::FetchConfig {
            base_url: self.api.base_url.clone(),
            envelope: self.api.envelope.clone(),
            raw_dir: raw_dir.unwrap_or_else(|| self.data.raw_dir.clone()),
            page_size: self.api.page_size,
            fallback_offset_cap: self.api.fallback_offset_cap,
            page_delay: Duration::from_millis(self.api.page_delay_ms),
            retry: self.retry.into(),
        }
    }
}
