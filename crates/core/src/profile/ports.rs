//! Port interfaces for profile synchronization
//!
//! These traits define the boundaries between the engine and its external
//! collaborators: the remote record store and the presentation layer.

use async_trait::async_trait;
use profilesync_domain::{CreateRecordRequest, ProfileField, Result, UpdateRecordRequest};
use serde_json::Value;

/// Authoritative remote record store.
///
/// Read operations return raw response bodies; every shape variant is
/// normalized by [`super::normalize`] so adapters stay thin.
#[async_trait]
pub trait RemoteProfileStore: Send + Sync {
    /// List records matching an identity (`GET /records?matching=<identity>`).
    async fn find_records(&self, identity: &str) -> Result<Value>;

    /// Fetch full record detail (`GET /record/{id}`).
    ///
    /// Returns `Ok(None)` when the record does not exist.
    async fn fetch_record(&self, record_id: &str) -> Result<Option<Value>>;

    /// Create a record (`POST /record`), returning the raw response body.
    async fn create_record(&self, request: &CreateRecordRequest) -> Result<Value>;

    /// Partially update a record (`PATCH /record/{id}`).
    async fn update_record(&self, record_id: &str, request: &UpdateRecordRequest) -> Result<()>;
}

/// Answer to the "leave with unsaved changes?" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    /// Leave and discard the draft.
    Leave,
    /// Cancel the navigation and keep editing.
    Stay,
}

/// Presentation-side prompt shown when navigating away from a dirty surface.
#[async_trait]
pub trait LeavePrompt: Send + Sync {
    /// Ask the user whether to leave. `changed` lists the unsaved fields.
    async fn confirm_leave(&self, changed: &[ProfileField]) -> LeaveDecision;
}

/// Browser-level "are you sure" interception for tab close and refresh.
pub trait UnloadInterceptor: Send + Sync {
    fn arm(&self);
    fn disarm(&self);
}
