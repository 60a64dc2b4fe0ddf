//! Application configuration.
//!
//! Read from `config.toml` (every field optional). Lookup order when no
//! path is given: `<config dir>/nearby-flights/config.toml`, then
//! `./nearby-flights.toml`, then built-in defaults.
//!
//! ```toml
//! api_base_url = "https://booking.example.com/api"
//! reanalyze_delay_ms = 300
//! recommendation_limit = 6
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 1000
//! max_delay_ms = 5000
//! attempt_timeout_ms = 10000
//!
//! [breaker]
//! failure_threshold = 3
//! reset_timeout_ms = 30000
//! ```

use fetcher::{CircuitBreaker, RetryPolicy};
use flight_data::storage::APP_DIR_NAME;
use flight_data::JsonFileStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("No data directory available; set `data_dir` in the config file")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            attempt_timeout_ms: policy.attempt_timeout.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: fetcher::circuit_breaker::DEFAULT_FAILURE_THRESHOLD,
            reset_timeout_ms: fetcher::circuit_breaker::DEFAULT_RESET_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Booking API root; candidates come from `{api_base_url}/flights/nearby`
    pub api_base_url: String,

    /// Where persisted records live (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,

    pub retry: RetryConfig,
    pub breaker: BreakerConfig,

    /// Quiet period before derived preferences are recomputed
    pub reanalyze_delay_ms: u64,

    pub recommendation_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            data_dir: None,
            retry: RetryConfig::default(),
            breaker: BreakerConfig::default(),
            reanalyze_delay_ms: preferences::store::DEFAULT_REANALYZE_DELAY.as_millis() as u64,
            recommendation_limit: pipeline::DEFAULT_LIMIT,
        }
    }
}

impl AppConfig {
    /// First existing config file in the standard locations.
    pub fn find_config_path() -> Option<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|p| p.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)),
            Some(PathBuf::from(format!("{}.toml", APP_DIR_NAME))),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Load from `path`, or from the standard locations when `None`.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match Self::find_config_path() {
                Some(found) => Self::load_from_path(&found),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_path(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".to_string()));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.breaker.reset_timeout_ms > i64::MAX as u64 {
            return Err(ConfigError::Invalid(format!(
                "breaker.reset_timeout_ms must not exceed {}",
                i64::MAX
            )));
        }
        if self.recommendation_limit == 0 {
            return Err(ConfigError::Invalid(
                "recommendation_limit must be at least 1".to_string(),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        self.data_dir
            .clone()
            .or_else(JsonFileStore::default_dir)
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            attempt_timeout: Duration::from_millis(self.retry.attempt_timeout_ms),
        }
    }

    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::with_limits(
            self.breaker.failure_threshold,
            Duration::from_millis(self.breaker.reset_timeout_ms),
        )
    }

    pub fn reanalyze_delay(&self) -> Duration {
        Duration::from_millis(self.reanalyze_delay_ms)
    }
}
