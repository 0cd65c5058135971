//! Remote profile API client
//!
//! Thin JSON client over [`HttpClient`]: joins paths onto the base URL,
//! attaches the bearer token, enforces an overall timeout and maps non-success
//! statuses onto [`ApiError`].

use std::sync::Arc;
use std::time::Duration;

use profilesync_domain::constants::{DEFAULT_API_MAX_ATTEMPTS, DEFAULT_API_TIMEOUT_SECS};
use profilesync_domain::{ApiConfig, ProfileSyncError};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::auth::AccessTokenProvider;
use super::errors::ApiError;
use crate::http::HttpClient;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL, e.g. `https://school.example/api`
    pub base_url: String,
    /// Overall timeout per call, covering all retry attempts
    pub timeout: Duration,
    pub max_attempts: usize,
    /// Initial retry backoff, doubled per retry
    pub base_backoff: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: if config.timeout_secs == 0 {
                Duration::from_secs(DEFAULT_API_TIMEOUT_SECS)
            } else {
                config.timeout()
            },
            max_attempts: if config.max_attempts == 0 {
                DEFAULT_API_MAX_ATTEMPTS
            } else {
                config.max_attempts
            },
            base_backoff: Duration::from_millis(200),
        }
    }
}

pub struct ApiClient {
    http_client: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(
        config: ApiClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .base_backoff(config.base_backoff)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http_client, auth, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// `GET` and deserialize.
    ///
    /// # Errors
    /// Returns the mapped [`ApiError`] for transport failures, non-success
    /// statuses and undecodable bodies.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        Self::decode(response).await
    }

    /// `GET` where 404 means "absent" rather than an error.
    ///
    /// # Errors
    /// As [`Self::get`], except that 404 yields `Ok(None)`.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        match self.execute(Method::GET, path, None).await {
            Ok(response) => Self::decode(response).await.map(Some),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `POST` a JSON body and deserialize the response.
    ///
    /// # Errors
    /// As [`Self::get`].
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = Self::encode(body)?;
        let response = self.execute(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }

    /// `PATCH` a JSON body, discarding any response body.
    ///
    /// # Errors
    /// As [`Self::get`].
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), ApiError> {
        let body = Self::encode(body)?;
        self.execute(Method::PATCH, path, Some(body)).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(%method, url = %url, "API request");

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .header("Accept", "application/json");
        if let Some(token) = self.auth.access_token().await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let timeout = self.config.timeout;
        let response = match tokio::time::timeout(timeout, self.http_client.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(ProfileSyncError::Config(message))) => return Err(ApiError::Config(message)),
            Ok(Err(err)) => return Err(ApiError::Network(err.to_string())),
            Err(_) => return Err(ApiError::Timeout(timeout)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, &method, &url, &body));
        }

        debug!(%method, url = %url, %status, "API request successful");
        Ok(response)
    }

    fn encode<T: Serialize>(body: &T) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response: {e}")))?;

        // 204/205 carry no body; some deployments also answer 200 with none.
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT || bytes.is_empty() {
            return serde_json::from_value(Value::Null).map_err(|_| {
                ApiError::Decode(format!("empty {} response where a body was expected", status.as_u16()))
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
    }

    fn map_status_error(status: StatusCode, method: &Method, url: &str, body: &str) -> ApiError {
        let message = if body.is_empty() {
            format!("{method} {url} returned status {status}")
        } else {
            format!("{method} {url} returned status {status}: {body}")
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Rejected(message)
            }
            s if s.is_server_error() => ApiError::Server(message),
            s if s.is_client_error() => ApiError::Client(message),
            _ => ApiError::Network(message),
        }
    }
}
