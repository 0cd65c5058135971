//! Configuration structures
//!
//! Loaded by `profilesync-infra::config` from the environment or a JSON/TOML
//! file. Every section has defaults so partial files are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_MAX_ATTEMPTS, DEFAULT_API_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_RECONCILE_INTERVAL_SECS,
};
use crate::errors::{ProfileSyncError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub reconciliation: ReconciliationConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that would make the engine misbehave at runtime.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ProfileSyncError::Config("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ProfileSyncError::Config("api.timeout_secs must be positive".into()));
        }
        if self.api.max_attempts == 0 {
            return Err(ProfileSyncError::Config("api.max_attempts must be positive".into()));
        }
        if self.reconciliation.interval_seconds == 0 {
            return Err(ProfileSyncError::Config(
                "reconciliation.interval_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Remote profile API settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Total attempts per request (initial try + retries).
    pub max_attempts: usize,
    /// Bearer token forwarded on every request. Session management is
    /// handled elsewhere; this is only the handoff point.
    pub access_token: Option<String>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            max_attempts: DEFAULT_API_MAX_ATTEMPTS,
            access_token: None,
        }
    }
}

/// Background reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl ReconciliationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self { interval_seconds: DEFAULT_RECONCILE_INTERVAL_SECS, enabled: true }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
