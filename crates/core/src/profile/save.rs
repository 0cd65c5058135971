//! Save committer
//!
//! Creates the remote record on first save and partially updates it
//! afterwards. On success the baseline is rebased to exactly the values
//! that were sent, with no re-fetch, so the surface reads clean at once.
//! On failure neither the draft nor the baseline is touched. A failed first
//! save leaves presence unknown, so a create whose response was lost is
//! never repeated blindly.

use chrono::{DateTime, Utc};
use profilesync_domain::constants::MAX_NAME_LENGTH;
use profilesync_domain::{
    CreateRecordRequest, ProfileFields, ProfileSyncError, Result, UpdateRecordRequest,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::normalize;
use super::session::{Presence, ProfileSession};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    #[default]
    Idle,
    Saving,
}

/// Acknowledgement of a committed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveAck {
    pub record_id: String,
    /// Whether this save created the record.
    pub created: bool,
    pub saved_at: DateTime<Utc>,
}

/// Result of the most recent save attempt, kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Succeeded(SaveAck),
    Failed(ProfileSyncError),
}

#[derive(Debug, Default)]
pub(super) struct SaveState {
    pub(super) phase: SavePhase,
    /// Bumped when a save starts; reconciliation compares it to detect a
    /// save that overlapped its fetch.
    pub(super) generation: u64,
    pub(super) last_outcome: Option<SaveOutcome>,
}

/// Resets the save phase when the save future completes or is dropped.
struct InFlight<'a> {
    session: &'a ProfileSession,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.inner.state.lock().save.phase = SavePhase::Idle;
    }
}

/// Local checks run before anything is sent.
///
/// # Errors
/// Returns `ProfileSyncError::Validation` if the trimmed name is too long.
pub fn validate_for_save(fields: &ProfileFields) -> Result<()> {
    let length = fields.trimmed_name().chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ProfileSyncError::Validation(format!(
            "name is {length} characters; the limit is {MAX_NAME_LENGTH}"
        )));
    }
    Ok(())
}

impl ProfileSession {
    /// Commit the current draft.
    ///
    /// Only one save runs at a time per session. Edits made while the
    /// request is in flight stay in the draft and stay guarded.
    ///
    /// # Errors
    /// - `ProfileSyncError::SaveInProgress` if a save is already running
    /// - `ProfileSyncError::Validation` if the draft fails local checks or
    ///   the server rejects it
    /// - `ProfileSyncError::Network` on transport failure
    /// - `ProfileSyncError::Detached` after unmount
    #[instrument(skip(self), fields(user_id = %self.inner.user_id))]
    pub async fn save(&self) -> Result<SaveAck> {
        let (fields, checkpoint, presence) = {
            let mut state = self.inner.state.lock();
            self.ensure_attached()?;
            if state.save.phase == SavePhase::Saving {
                return Err(ProfileSyncError::SaveInProgress);
            }
            if let Err(err) = validate_for_save(state.draft.fields()) {
                state.save.last_outcome = Some(SaveOutcome::Failed(err.clone()));
                debug!(error = %err, "draft rejected before sending");
                return Err(err);
            }

            state.save.phase = SavePhase::Saving;
            state.save.generation += 1;
            (state.draft.fields().clone(), state.guard.checkpoint(), state.presence.clone())
        };
        let _in_flight = InFlight { session: self };

        let result = self.commit(&fields, presence.clone()).await;

        if self.is_detached() {
            debug!("session detached during save; result not applied");
            return result;
        }

        let mut state = self.inner.state.lock();
        match &result {
            Ok(ack) => {
                state.baseline.replace(fields);
                state.guard.clear_through(checkpoint);
                state.presence = Presence::Present { record_id: ack.record_id.clone() };
                state.load_error = None;
                state.save.last_outcome = Some(SaveOutcome::Succeeded(ack.clone()));
                self.publish_dirty(&state);
                info!(
                    record_id = %ack.record_id,
                    created = ack.created,
                    still_dirty = state.is_dirty(),
                    "profile saved"
                );
            }
            Err(err) => {
                // A failed create may still have committed on the server, so
                // the next save must look the record up again.
                if !presence.exists_on_server() {
                    state.presence = Presence::Unknown;
                }
                state.save.last_outcome = Some(SaveOutcome::Failed(err.clone()));
                warn!(error = %err, error_kind = err.label(), "profile save failed");
            }
        }
        drop(state);

        result
    }

    async fn commit(&self, fields: &ProfileFields, presence: Presence) -> Result<SaveAck> {
        let record_id = match presence {
            Presence::Present { record_id } => Some(record_id),
            Presence::Absent => None,
            Presence::Unknown => {
                debug!("record presence unknown; looking it up before saving");
                self.inner.loader.resolve_record_id(&self.inner.user_id).await?
            }
        };

        match record_id {
            Some(record_id) => {
                let request = UpdateRecordRequest::from(fields);
                self.inner.store.update_record(&record_id, &request).await?;
                Ok(SaveAck { record_id, created: false, saved_at: Utc::now() })
            }
            None => {
                let request = CreateRecordRequest::new(self.inner.user_id.clone(), fields);
                let body = self.inner.store.create_record(&request).await?;
                let record_id = normalize::created_record_id(&body).ok_or_else(|| {
                    ProfileSyncError::Internal("create response carried no record id".into())
                })?;
                Ok(SaveAck { record_id, created: true, saved_at: Utc::now() })
            }
        }
    }
}
