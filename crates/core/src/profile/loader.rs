//! Profile loader
//!
//! Resolves the remote record for a user in two steps: an identity lookup
//! over the listing endpoint, then a detail fetch. A lookup with no match
//! short-circuits; the detail endpoint is never called for a record that is
//! known not to exist.

use std::sync::Arc;

use profilesync_domain::{CompanionCatalog, ProfileRecord, ProfileSyncError, Result};
use tracing::{debug, info, instrument, warn};

use super::normalize;
use super::ports::RemoteProfileStore;

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No record exists yet; the draft stays at client-side defaults.
    NotFound,
    Found(ProfileRecord),
}

impl LoadOutcome {
    pub fn found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Locates and normalizes the remote profile record.
#[derive(Clone)]
pub struct ProfileLoader {
    store: Arc<dyn RemoteProfileStore>,
    catalog: Arc<CompanionCatalog>,
}

impl ProfileLoader {
    pub fn new(store: Arc<dyn RemoteProfileStore>, catalog: Arc<CompanionCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Find the record id owned by `user_id`.
    ///
    /// Returns `Ok(None)` when no listing entry matches. When several match,
    /// the first in listing order wins.
    ///
    /// # Errors
    /// Propagates store failures (typically `ProfileSyncError::Network`).
    #[instrument(skip(self))]
    pub async fn resolve_record_id(&self, user_id: &str) -> Result<Option<String>> {
        let listing = self.store.find_records(user_id).await?;
        let mut matches = normalize::matching_record_ids(&listing, user_id);

        if matches.len() > 1 {
            warn!(
                user_id,
                match_count = matches.len(),
                record_ids = ?matches,
                "multiple records match one identity; using the first"
            );
        }

        if matches.is_empty() {
            debug!(user_id, "no remote record matches identity");
            return Ok(None);
        }
        Ok(Some(matches.swap_remove(0)))
    }

    /// Fetch and normalize one record's detail.
    ///
    /// A missing record (404) is `Ok(None)`, not an error.
    ///
    /// # Errors
    /// Propagates store failures other than `NotFound`, and malformed detail
    /// bodies as `ProfileSyncError::Internal`.
    #[instrument(skip(self))]
    pub async fn fetch(&self, record_id: &str, user_id: &str) -> Result<Option<ProfileRecord>> {
        let body = match self.store.fetch_record(record_id).await {
            Ok(Some(body)) => body,
            Ok(None) | Err(ProfileSyncError::NotFound(_)) => {
                debug!(record_id, "record detail not found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        normalize::normalize_record(&body, record_id, user_id, &self.catalog).map(Some)
    }

    /// Run the full lookup-then-fetch sequence.
    ///
    /// # Errors
    /// Propagates store failures from either step.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: &str) -> Result<LoadOutcome> {
        let Some(record_id) = self.resolve_record_id(user_id).await? else {
            return Ok(LoadOutcome::NotFound);
        };

        match self.fetch(&record_id, user_id).await? {
            Some(record) => {
                info!(user_id, record_id = %record.record_id, "profile record loaded");
                Ok(LoadOutcome::Found(record))
            }
            None => Ok(LoadOutcome::NotFound),
        }
    }
}
