//! Normalization of remote response shapes
//!
//! The remote store has accumulated several spellings for the same data over
//! time. This module is the single place where they are folded into the
//! canonical [`ProfileRecord`]; nothing downstream re-inspects raw JSON.
//!
//! Accepted variants:
//! - listings: bare array, or an object wrapping it in `data`, `records` or
//!   `items`
//! - detail and create responses: bare object, or wrapped in `data`
//! - record id: `id` or `_id` (string or number)
//! - owner identity: `userId`, `user_id` or `studentId`
//! - profile section: nested under `profile` or flat on the record
//! - voice feedback flag: `ttsEnabled` or `tts_enabled`
//! - companion: object with an `id`, or a bare id

use profilesync_domain::{
    Companion, CompanionCatalog, CompanionId, Interest, ProfileFields, ProfileRecord,
    ProfileSyncError, Result, TaggedInterest, Theme,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const IDENTITY_KEYS: [&str; 3] = ["userId", "user_id", "studentId"];
const RECORD_ID_KEYS: [&str; 2] = ["id", "_id"];
const LISTING_KEYS: [&str; 3] = ["data", "records", "items"];
const NAME_KEYS: [&str; 2] = ["name", "displayName"];
const TTS_KEYS: [&str; 2] = ["ttsEnabled", "tts_enabled"];

/// Entries of a listing response, whatever its envelope.
pub fn listing_entries(body: &Value) -> Vec<&Value> {
    match body {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            for key in LISTING_KEYS {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.iter().collect();
                }
            }
            // Some deployments answer a single-match query with the record
            // itself.
            if record_identity(body).is_some() {
                vec![body]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Strip a `data` envelope from a detail or create response.
pub fn unwrap_detail(body: &Value) -> &Value {
    match body.get("data") {
        Some(inner @ Value::Object(_)) => inner,
        _ => body,
    }
}

/// Owner identity of a record, checking every legacy key.
pub fn record_identity(entry: &Value) -> Option<String> {
    first_string(entry, &IDENTITY_KEYS)
}

/// Server record id of a record.
pub fn record_id(entry: &Value) -> Option<String> {
    first_string(entry, &RECORD_ID_KEYS)
}

/// Record ids of every listing entry owned by `user_id`, in listing order.
pub fn matching_record_ids(body: &Value, user_id: &str) -> Vec<String> {
    let wanted = user_id.trim();
    listing_entries(body)
        .into_iter()
        .filter(|entry| record_identity(entry).is_some_and(|identity| identity.trim() == wanted))
        .filter_map(record_id)
        .collect()
}

/// Record id carried by a create response.
pub fn created_record_id(body: &Value) -> Option<String> {
    record_id(unwrap_detail(body)).or_else(|| record_id(body))
}

/// Normalize a detail response into a [`ProfileRecord`].
///
/// `known_record_id` and `user_id` are the values the caller already
/// resolved; they are used when the body omits them.
///
/// # Errors
/// Returns `ProfileSyncError::Internal` if the body is not a JSON object.
pub fn normalize_record(
    body: &Value,
    known_record_id: &str,
    user_id: &str,
    catalog: &CompanionCatalog,
) -> Result<ProfileRecord> {
    let detail = unwrap_detail(body);
    let Value::Object(map) = detail else {
        return Err(ProfileSyncError::Internal(format!(
            "record {known_record_id} detail is not an object"
        )));
    };

    let profile = match map.get("profile") {
        Some(Value::Object(section)) => section,
        _ => map,
    };

    let fields = ProfileFields {
        name: first_string_in(profile, &NAME_KEYS),
        tts_enabled: first_bool_in(profile, &TTS_KEYS).unwrap_or(false),
        theme: Theme::from_optional(profile.get("theme").and_then(Value::as_str)),
        companion: normalize_companion(map.get("companion"), catalog),
        interests: normalize_interests(map.get("interests")),
    };

    Ok(ProfileRecord {
        record_id: record_id(detail).unwrap_or_else(|| known_record_id.to_string()),
        user_id: record_identity(detail).unwrap_or_else(|| user_id.to_string()),
        fields,
    })
}

/// Resolve a companion-shaped value against the catalog.
///
/// Missing or `null` means no companion. Anything else that does not name a
/// catalog entry is corrupt and replaced with the catalog default.
pub fn normalize_companion(raw: Option<&Value>, catalog: &CompanionCatalog) -> Option<Companion> {
    let raw = match raw {
        None | Some(Value::Null) => return None,
        Some(value) => value,
    };

    let id = match raw {
        Value::Object(map) => map.get("id").and_then(companion_id),
        other => companion_id(other),
    };

    match id.and_then(|id| catalog.get(id)) {
        Some(companion) => Some(companion.clone()),
        None => {
            let fallback = catalog.default_companion().clone();
            warn!(
                raw = %raw,
                fallback_id = %fallback.id,
                "companion reference outside catalog; substituting default"
            );
            Some(fallback)
        }
    }
}

/// Normalize the interests collection, keeping order.
pub fn normalize_interests(raw: Option<&Value>) -> Vec<Interest> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(value) if !value.trim().is_empty() => {
                Some(Interest::Freeform(value.clone()))
            }
            Value::Object(map) => {
                let value = first_string_in(map, &["value", "label"])?;
                match first_string_in(map, &["id"]) {
                    Some(id) => Some(Interest::Tagged(TaggedInterest {
                        id,
                        value,
                        prompt: first_string_in(map, &["prompt"]),
                    })),
                    None => Some(Interest::Freeform(value)),
                }
            }
            other => {
                debug!(entry = %other, "skipping unrecognised interest entry");
                None
            }
        })
        .collect()
}

fn companion_id(value: &Value) -> Option<CompanionId> {
    let raw = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    raw.map(CompanionId)
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    value.as_object().and_then(|map| first_string_in(map, keys))
}

fn first_string_in(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn first_bool_in(map: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_bool))
}
