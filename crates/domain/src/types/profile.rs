//! Profile types
//!
//! `ProfileFields` is the one canonical shape every engine component works
//! with: the draft, the baseline snapshot, and normalized server records.

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;
use crate::types::{Companion, Interest, Theme};

/// The user-editable portion of a profile record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub tts_enabled: bool,
    pub theme: Theme,
    pub companion: Option<Companion>,
    pub interests: Vec<Interest>,
}

impl ProfileFields {
    /// Name with surrounding whitespace removed; empty names read as `""`.
    pub fn trimmed_name(&self) -> &str {
        self.name.as_deref().map_or("", str::trim)
    }

    pub fn focus_topic_count(&self) -> usize {
        self.interests.iter().filter(|interest| interest.is_focus_topic()).count()
    }

    /// Copy `field` from `source` into `self`.
    pub fn copy_field_from(&mut self, source: &Self, field: ProfileField) {
        match field {
            ProfileField::Name => self.name.clone_from(&source.name),
            ProfileField::TtsEnabled => self.tts_enabled = source.tts_enabled,
            ProfileField::Theme => self.theme = source.theme,
            ProfileField::Companion => self.companion.clone_from(&source.companion),
            ProfileField::Interests => self.interests.clone_from(&source.interests),
        }
    }
}

/// A normalized server record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Server-assigned record id, used for detail fetches and updates.
    pub record_id: String,
    /// Owner identity, used as the lookup key.
    pub user_id: String,
    pub fields: ProfileFields,
}

/// Names of the editable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    TtsEnabled,
    Theme,
    Companion,
    Interests,
}

impl_domain_enum_conversions!(ProfileField {
    Name => "name",
    TtsEnabled => "tts_enabled",
    Theme => "theme",
    Companion => "companion",
    Interests => "interests",
});

impl ProfileField {
    pub const ALL: [Self; 5] =
        [Self::Name, Self::TtsEnabled, Self::Theme, Self::Companion, Self::Interests];
}
