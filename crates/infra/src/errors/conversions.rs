//! Conversions from external infrastructure errors into domain errors.

use profilesync_domain::ProfileSyncError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
///
/// Only errors raised before a status is seen pass through here. Status
/// codes are classified by `ApiClient`.
#[derive(Debug)]
pub struct InfraError(pub ProfileSyncError);

impl From<InfraError> for ProfileSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

trait IntoProfileSyncError {
    fn into_profilesync(self) -> ProfileSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ProfileSyncError */
/* -------------------------------------------------------------------------- */

impl IntoProfileSyncError for HttpError {
    fn into_profilesync(self) -> ProfileSyncError {
        if self.is_timeout() {
            return ProfileSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ProfileSyncError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return ProfileSyncError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return ProfileSyncError::Internal(format!("malformed response body: {self}"));
        }

        ProfileSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_profilesync())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → ProfileSyncError */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        Self(ProfileSyncError::Config(format!("Invalid TOML format: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
