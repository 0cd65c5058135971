//! Request authentication
//!
//! Session management lives outside this engine. The API client only asks a
//! provider for the bearer token to attach, if any.

use async_trait::async_trait;

use super::errors::ApiError;

/// Source of the bearer token attached to every API request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current token, or `None` to send the request unauthenticated.
    async fn access_token(&self) -> Result<Option<String>, ApiError>;
}

/// Provider with a fixed token, typically from configuration.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token: token.filter(|token| !token.trim().is_empty()) }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token.clone())
    }
}
