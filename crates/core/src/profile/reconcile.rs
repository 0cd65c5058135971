//! Background reconciliation
//!
//! Every reconciliation request, whatever triggered it, goes through
//! [`ProfileSession::reconcile`]. It re-fetches the record and merges the
//! server values into the baseline and draft, except for fields the user
//! has edited since the last successful save. Failures are logged and
//! reported in the outcome; they never reach the user as errors.

use profilesync_domain::{impl_domain_enum_conversions, ProfileField, ProfileSyncError};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::dirty::field_changed;
use super::save::SavePhase;
use super::session::{Presence, ProfileSession};

/// Why a reconciliation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileTrigger {
    Interval,
    VisibilityRegained,
    FocusRegained,
    Manual,
}

impl_domain_enum_conversions!(ReconcileTrigger {
    Interval => "interval",
    VisibilityRegained => "visibility_regained",
    FocusRegained => "focus_regained",
    Manual => "manual",
});

/// Why a reconciliation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Detached,
    /// No record is known to exist; there is nothing to reconcile with.
    NoServerRecord,
    SaveInFlight,
    /// A save started after this fetch was issued; its result is stale.
    StaleAfterSave,
    /// The detail endpoint answered 404.
    RecordMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied {
        /// Fields updated from the server.
        changed: Vec<ProfileField>,
        /// Guarded fields whose server value differs and was discarded.
        suppressed: Vec<ProfileField>,
    },
    Skipped(SkipReason),
    Failed(ProfileSyncError),
}

impl ReconcileOutcome {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl ProfileSession {
    /// Re-fetch the record and merge it under the conflict guard.
    pub async fn reconcile(&self, trigger: ReconcileTrigger) -> ReconcileOutcome {
        let (record_id, generation) = {
            let state = self.inner.state.lock();
            if self.is_detached() {
                return ReconcileOutcome::Skipped(SkipReason::Detached);
            }
            let Presence::Present { record_id } = &state.presence else {
                return ReconcileOutcome::Skipped(SkipReason::NoServerRecord);
            };
            if state.save.phase == SavePhase::Saving {
                return ReconcileOutcome::Skipped(SkipReason::SaveInFlight);
            }
            (record_id.clone(), state.save.generation)
        };

        let fetched = self.inner.loader.fetch(&record_id, &self.inner.user_id).await;

        if self.is_detached() {
            return ReconcileOutcome::Skipped(SkipReason::Detached);
        }

        let record = match fetched {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(%record_id, trigger = trigger.as_str(), "record vanished; keeping local state");
                return ReconcileOutcome::Skipped(SkipReason::RecordMissing);
            }
            Err(err) => {
                warn!(
                    %record_id,
                    trigger = trigger.as_str(),
                    error = %err,
                    error_kind = err.label(),
                    "reconciliation fetch failed"
                );
                return ReconcileOutcome::Failed(err);
            }
        };

        let mut state = self.inner.state.lock();
        if state.save.phase == SavePhase::Saving {
            return ReconcileOutcome::Skipped(SkipReason::SaveInFlight);
        }
        if state.save.generation != generation {
            debug!(%record_id, "save completed during fetch; discarding result");
            return ReconcileOutcome::Skipped(SkipReason::StaleAfterSave);
        }

        let server = &record.fields;
        let mut next_baseline = state.baseline.fields().clone();
        let mut changed = Vec::new();
        let mut suppressed = Vec::new();

        for field in ProfileField::ALL {
            if !field_changed(field, server, state.baseline.fields()) {
                continue;
            }
            if state.guard.is_guarded(field) {
                suppressed.push(field);
            } else {
                next_baseline.copy_field_from(server, field);
                state.draft.adopt(server, field);
                changed.push(field);
            }
        }

        if !changed.is_empty() {
            state.baseline.replace(next_baseline);
            self.publish_dirty(&state);
            debug!(%record_id, trigger = trigger.as_str(), ?changed, "applied server changes");
        }
        if !suppressed.is_empty() {
            info!(
                %record_id,
                trigger = trigger.as_str(),
                fields = ?suppressed,
                "conflict_suppressed: keeping local edits over server values"
            );
        }
        drop(state);

        ReconcileOutcome::Applied { changed, suppressed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_labels_round_trip() {
        for trigger in [
            ReconcileTrigger::Interval,
            ReconcileTrigger::VisibilityRegained,
            ReconcileTrigger::FocusRegained,
            ReconcileTrigger::Manual,
        ] {
            assert_eq!(trigger.as_str().parse::<ReconcileTrigger>(), Ok(trigger));
        }
    }

    #[test]
    fn only_applied_counts_as_applied() {
        let applied = ReconcileOutcome::Applied { changed: vec![], suppressed: vec![] };
        assert!(applied.is_applied());
        assert!(!ReconcileOutcome::Skipped(SkipReason::SaveInFlight).is_applied());
    }
}
