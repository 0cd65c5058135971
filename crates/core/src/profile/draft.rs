//! Draft buffer and baseline snapshot
//!
//! The draft is the locally edited working copy. The baseline is the last
//! known saved state; it is never edited in place, only replaced wholesale
//! by a load, a reconciliation merge, or a successful save.

use std::sync::Arc;

use profilesync_domain::constants::MAX_FOCUS_TOPICS;
use profilesync_domain::{
    Companion, Interest, ProfileField, ProfileFields, ProfileSyncError, Result, Theme,
};

/// Locally edited working copy of every editable field.
///
/// Each setter replaces exactly one field and returns which field it
/// touched, so the caller can mark the conflict guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftBuffer {
    fields: ProfileFields,
}

impl DraftBuffer {
    pub fn fields(&self) -> &ProfileFields {
        &self.fields
    }

    /// Store the name as typed. Trimming happens on compare and on send.
    pub fn set_name(&mut self, name: impl Into<String>) -> ProfileField {
        self.fields.name = Some(name.into());
        ProfileField::Name
    }

    pub fn set_tts_enabled(&mut self, enabled: bool) -> ProfileField {
        self.fields.tts_enabled = enabled;
        ProfileField::TtsEnabled
    }

    pub fn set_theme(&mut self, theme: Theme) -> ProfileField {
        self.fields.theme = theme;
        ProfileField::Theme
    }

    /// Replace the companion. Catalog membership is checked by the session.
    pub fn set_companion(&mut self, companion: Companion) -> ProfileField {
        self.fields.companion = Some(companion);
        ProfileField::Companion
    }

    /// Append an interest.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Validation` for a blank entry, a duplicate
    /// entry, or a focus topic beyond the cap.
    pub fn add_interest(&mut self, interest: Interest) -> Result<ProfileField> {
        let interest = match interest {
            Interest::Freeform(value) => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ProfileSyncError::Validation("interest must not be blank".into()));
                }
                let folded = value.to_lowercase();
                let duplicate = self.fields.interests.iter().any(|existing| {
                    matches!(existing, Interest::Freeform(other) if other.trim().to_lowercase() == folded)
                });
                if duplicate {
                    return Err(ProfileSyncError::Validation(format!(
                        "interest '{value}' is already listed"
                    )));
                }
                Interest::Freeform(value.to_string())
            }
            Interest::Tagged(tagged) => {
                if tagged.id.trim().is_empty() {
                    return Err(ProfileSyncError::Validation("focus topic needs an id".into()));
                }
                let duplicate = self.fields.interests.iter().any(|existing| {
                    matches!(existing, Interest::Tagged(other) if other.id == tagged.id)
                });
                if duplicate {
                    return Err(ProfileSyncError::Validation(format!(
                        "focus topic '{}' is already listed",
                        tagged.id
                    )));
                }
                if self.fields.focus_topic_count() >= MAX_FOCUS_TOPICS {
                    return Err(ProfileSyncError::Validation(format!(
                        "at most {MAX_FOCUS_TOPICS} focus topics are allowed"
                    )));
                }
                Interest::Tagged(tagged)
            }
        };

        self.fields.interests.push(interest);
        Ok(ProfileField::Interests)
    }

    /// Remove the interest at `index`, returning it.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Validation` if `index` is out of range.
    pub fn remove_interest(&mut self, index: usize) -> Result<Interest> {
        if index >= self.fields.interests.len() {
            return Err(ProfileSyncError::Validation(format!(
                "no interest at position {index}"
            )));
        }
        Ok(self.fields.interests.remove(index))
    }

    /// Adopt the server value of one field.
    pub(super) fn adopt(&mut self, source: &ProfileFields, field: ProfileField) {
        self.fields.copy_field_from(source, field);
    }
}

/// Immutable snapshot of the last known saved state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    snapshot: Arc<ProfileFields>,
}

impl Baseline {
    pub fn fields(&self) -> &ProfileFields {
        &self.snapshot
    }

    /// Shared handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<ProfileFields> {
        Arc::clone(&self.snapshot)
    }

    /// Swap in a new snapshot.
    pub(super) fn replace(&mut self, fields: ProfileFields) {
        self.snapshot = Arc::new(fields);
    }
}
