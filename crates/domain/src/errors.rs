//! Error types used throughout the engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ProfileSync
///
/// A suppressed background update is not an error and has no variant here;
/// see `ReconcileOutcome` in `profilesync-core`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ProfileSyncError {
    /// Transport failure. Retryable by the next scheduler tick or a manual
    /// retry.
    #[error("Network error: {0}")]
    Network(String),

    /// The record does not exist. Expected, not an error state, for loads.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A write was rejected, locally or by the server.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A save for this session is already running.
    #[error("Save already in progress")]
    SaveInProgress,

    /// The session was unmounted.
    #[error("Profile session detached")]
    Detached,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProfileSyncError {
    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::SaveInProgress => "save_in_progress",
            Self::Detached => "detached",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for ProfileSync operations
pub type Result<T> = std::result::Result<T, ProfileSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(ProfileSyncError::Network("reset".into()).is_retryable());
        assert!(!ProfileSyncError::NotFound("x".into()).is_retryable());
        assert!(!ProfileSyncError::Validation("x".into()).is_retryable());
        assert!(!ProfileSyncError::SaveInProgress.is_retryable());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(ProfileSyncError::Validation("name too long".into()))
            .unwrap();
        assert_eq!(json["type"], "Validation");
        assert_eq!(json["message"], "name too long");

        let unit = serde_json::to_value(ProfileSyncError::SaveInProgress).unwrap();
        assert_eq!(unit["type"], "SaveInProgress");
    }
}
