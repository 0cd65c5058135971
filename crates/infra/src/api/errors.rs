//! API-specific error types
//!
//! Classifies failures of the remote profile API and folds them into the
//! engine's error vocabulary.

use std::time::Duration;

use profilesync_domain::ProfileSyncError;
use thiserror::Error;

/// Remote profile API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 400, 409 or 422: the server refused the payload.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl From<ApiError> for ProfileSyncError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err {
            ApiError::NotFound(_) => Self::NotFound(message),
            ApiError::Rejected(_) | ApiError::Client(_) => Self::Validation(message),
            ApiError::Decode(_) => Self::Internal(message),
            ApiError::Config(_) => Self::Config(message),
            ApiError::Auth(_)
            | ApiError::RateLimit(_)
            | ApiError::Server(_)
            | ApiError::Network(_)
            | ApiError::Timeout(_) => Self::Network(message),
        }
    }
}
