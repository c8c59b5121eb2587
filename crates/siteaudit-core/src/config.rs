use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::model::Strategy;
use crate::retry::RetryPolicy;

/// Environment variable holding the scoring API credential.
pub const API_KEY_ENV: &str = "PAGESPEED_API_KEY";

/// Configuration problems that must stop a run before any scheduling.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{API_KEY_ENV} is not set; export it before running a batch")]
    MissingApiKey,
    #[error("invalid batch config: {0}")]
    Invalid(String),
}

/// Slowest accepted call rate: one call every 1000 s.
pub const MIN_REQUESTS_PER_SECOND: f64 = 0.001;
/// Fastest accepted call rate.
pub const MAX_REQUESTS_PER_SECOND: f64 = 1000.0;

/// Scoring API endpoint parameters (`[api]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the scoring endpoint.
    pub endpoint: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 15,
        }
    }
}

/// Per-run batch parameters. Immutable once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum probes in flight across the whole run.
    pub max_concurrent_requests: usize,
    /// Attempts (including retries) allowed to start per second.
    pub requests_per_second: f64,
    /// Skip targets whose strategies all succeeded within this window (0 = off).
    pub skip_recent_hours: u64,
    /// Re-issues after the first attempt for retryable errors.
    pub max_retries: u32,
    /// Delay before the first retry, in seconds; doubles per retry.
    pub retry_base_delay_secs: f64,
    /// Upper bound for a single backoff delay, in seconds.
    pub retry_max_delay_secs: u64,
    /// Consecutive failing days before an endpoint is quarantined.
    pub quarantine_min_days: u32,
    /// Strategies probed for every target.
    pub strategies: Vec<Strategy>,
    /// Stop scheduling new probes after this many seconds (None = no deadline).
    pub soft_deadline_secs: Option<f64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            requests_per_second: 1.0,
            skip_recent_hours: 0,
            max_retries: 2,
            retry_base_delay_secs: 2.0,
            retry_max_delay_secs: 60,
            quarantine_min_days: 3,
            strategies: Strategy::ALL.to_vec(),
            soft_deadline_secs: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid("max_concurrent_requests must be at least 1".into()));
        }
        if !(MIN_REQUESTS_PER_SECOND..=MAX_REQUESTS_PER_SECOND).contains(&self.requests_per_second) {
            return Err(ConfigError::Invalid(format!(
                "requests_per_second must be between {} and {}",
                MIN_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_SECOND
            )));
        }
        if !(self.retry_base_delay_secs.is_finite() && self.retry_base_delay_secs >= 0.0) {
            return Err(ConfigError::Invalid("retry_base_delay_secs must be non-negative".into()));
        }
        if self
            .soft_deadline_secs
            .is_some_and(|s| !(s.is_finite() && s >= 0.0))
        {
            return Err(ConfigError::Invalid("soft_deadline_secs must be non-negative".into()));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("at least one strategy is required".into()));
        }
        if self.quarantine_min_days == 0 {
            return Err(ConfigError::Invalid("quarantine_min_days must be at least 1".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::try_from_secs_f64(self.retry_base_delay_secs).unwrap_or_default(),
            max_delay: Duration::from_secs(self.retry_max_delay_secs),
        }
    }

    pub fn soft_deadline(&self) -> Option<Duration> {
        self.soft_deadline_secs
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

/// Global configuration loaded from `~/.config/siteaudit/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Optional state directory override (progress file, database, logs).
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AuditConfig {
    /// State directory: config override, else `~/.local/state/siteaudit`.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_state_dir(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("siteaudit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn default_state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("siteaudit")?;
    Ok(xdg_dirs.get_state_home().join("siteaudit"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AuditConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AuditConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AuditConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Read the API credential from the environment.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, ConfigError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingApiKey),
    }
}
