//! Tracing setup
//!
//! The engine only emits `tracing` events. A subscriber the host installed
//! first is left in place.

use profilesync_domain::{LoggingConfig, ProfileSyncError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `false` when a
/// global subscriber already exists and nothing was installed.
///
/// # Errors
/// Returns `ProfileSyncError::Config` if the level is not a valid filter.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };

    match installed {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::debug!(error = %e, "tracing subscriber already installed");
            Ok(false)
        }
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ProfileSyncError::Config(format!("Invalid log level '{}': {e}", config.level))),
    }
}
