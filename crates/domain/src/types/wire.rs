//! Request payloads for the remote profile store
//!
//! Writes always use the current camelCase shape. Reads are normalized in
//! `profilesync-core::profile::normalize`, which also accepts legacy shapes.

use serde::{Deserialize, Serialize};

use crate::types::{Companion, CompanionId, Interest, ProfileFields, Theme};

/// `profile` section of a write payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSection {
    pub name: Option<String>,
    pub tts_enabled: bool,
    pub theme: Theme,
}

/// Companion reference as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionPayload {
    pub id: CompanionId,
    pub name: String,
    pub image_url: String,
}

impl From<&Companion> for CompanionPayload {
    fn from(companion: &Companion) -> Self {
        Self {
            id: companion.id,
            name: companion.name.clone(),
            image_url: companion.image_ref.clone(),
        }
    }
}

/// Body of `POST /record`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub user_id: String,
    pub profile: ProfileSection,
    pub companion: Option<CompanionPayload>,
    pub interests: Vec<Interest>,
}

/// Body of `PATCH /record/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    pub profile: ProfileSection,
    pub companion: Option<CompanionPayload>,
    pub interests: Vec<Interest>,
}

impl From<&ProfileFields> for ProfileSection {
    fn from(fields: &ProfileFields) -> Self {
        let name = fields.trimmed_name();
        Self {
            name: if name.is_empty() { None } else { Some(name.to_string()) },
            tts_enabled: fields.tts_enabled,
            theme: fields.theme,
        }
    }
}

impl CreateRecordRequest {
    pub fn new(user_id: impl Into<String>, fields: &ProfileFields) -> Self {
        Self {
            user_id: user_id.into(),
            profile: ProfileSection::from(fields),
            companion: fields.companion.as_ref().map(CompanionPayload::from),
            interests: fields.interests.clone(),
        }
    }
}

impl From<&ProfileFields> for UpdateRecordRequest {
    fn from(fields: &ProfileFields) -> Self {
        Self {
            profile: ProfileSection::from(fields),
            companion: fields.companion.as_ref().map(CompanionPayload::from),
            interests: fields.interests.clone(),
        }
    }
}
