//! Configuration loader
//!
//! Loads engine configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. A `.env` file in the working directory is merged into the environment
//! 2. Environment variables are tried first; the base URL is required there
//! 3. Otherwise the first config file found by [`probe_config_paths`] is used
//! 4. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `PROFILESYNC_API_BASE_URL`: Profile API base URL (required)
//! - `PROFILESYNC_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `PROFILESYNC_API_MAX_ATTEMPTS`: Attempts per request, including the first
//! - `PROFILESYNC_API_TOKEN`: Bearer token handed over by the host application
//! - `PROFILESYNC_RECONCILE_INTERVAL_SECS`: Reconciliation interval in seconds
//! - `PROFILESYNC_RECONCILE_ENABLED`: Whether background reconciliation runs
//! - `PROFILESYNC_LOG_LEVEL`: Fallback log filter when `RUST_LOG` is unset
//! - `PROFILESYNC_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! `config.{json,toml}` then `profilesync.{json,toml}`, first in the working
//! directory and its parent, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use profilesync_domain::{
    ApiConfig, Config, LoggingConfig, ProfileSyncError, ReconciliationConfig, Result,
};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "profilesync.json", "profilesync.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ProfileSyncError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "merged .env file into environment");
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "environment incomplete, trying config file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `PROFILESYNC_API_BASE_URL` is required; everything else falls back
/// to the defaults.
///
/// # Errors
/// Returns `ProfileSyncError::Config` if the base URL is missing or a value
/// does not parse.
pub fn load_from_env() -> Result<Config> {
    let api_defaults = ApiConfig::default();
    let reconcile_defaults = ReconciliationConfig::default();
    let logging_defaults = LoggingConfig::default();

    let api = ApiConfig {
        base_url: env_var("PROFILESYNC_API_BASE_URL")?,
        timeout_secs: env_parse("PROFILESYNC_API_TIMEOUT_SECS")?
            .unwrap_or(api_defaults.timeout_secs),
        max_attempts: env_parse("PROFILESYNC_API_MAX_ATTEMPTS")?
            .unwrap_or(api_defaults.max_attempts),
        access_token: std::env::var("PROFILESYNC_API_TOKEN").ok(),
    };

    let reconciliation = ReconciliationConfig {
        interval_seconds: env_parse("PROFILESYNC_RECONCILE_INTERVAL_SECS")?
            .unwrap_or(reconcile_defaults.interval_seconds),
        enabled: env_bool("PROFILESYNC_RECONCILE_ENABLED", reconcile_defaults.enabled),
    };

    let logging = LoggingConfig {
        level: std::env::var("PROFILESYNC_LOG_LEVEL").unwrap_or(logging_defaults.level),
        json: env_bool("PROFILESYNC_LOG_JSON", logging_defaults.json),
    };

    Ok(Config { api, reconciliation, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is picked by
/// extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ProfileSyncError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ProfileSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ProfileSyncError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ProfileSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ProfileSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ProfileSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.join(".."));
        roots.insert(0, cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ProfileSyncError::Config(format!("Missing required environment variable: {key}")))
}

/// `Ok(None)` when unset, an error when set but unparsable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ProfileSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
