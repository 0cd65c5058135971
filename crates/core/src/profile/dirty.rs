//! Dirty detection
//!
//! Field-wise comparison of a draft against its baseline. The rules are
//! deliberately looser than `PartialEq` on [`ProfileFields`]:
//!
//! - name: compared after trimming
//! - companion: compared by id only, so a catalog rename is not an edit
//! - interests: order-sensitive; tagged entries compare by id and value and
//!   ignore the prompt; a freeform entry never equals a tagged one

use profilesync_domain::{Companion, Interest, ProfileField, ProfileFields};

/// Whether `draft` differs from `baseline` in any field.
pub fn is_dirty(draft: &ProfileFields, baseline: &ProfileFields) -> bool {
    ProfileField::ALL.into_iter().any(|field| field_changed(field, draft, baseline))
}

/// Every field in which `draft` differs from `baseline`, in declaration order.
pub fn changed_fields(draft: &ProfileFields, baseline: &ProfileFields) -> Vec<ProfileField> {
    ProfileField::ALL.into_iter().filter(|field| field_changed(*field, draft, baseline)).collect()
}

/// Whether one field differs.
pub fn field_changed(field: ProfileField, draft: &ProfileFields, baseline: &ProfileFields) -> bool {
    match field {
        ProfileField::Name => draft.trimmed_name() != baseline.trimmed_name(),
        ProfileField::TtsEnabled => draft.tts_enabled != baseline.tts_enabled,
        ProfileField::Theme => draft.theme != baseline.theme,
        ProfileField::Companion => !same_companion(draft.companion.as_ref(), baseline.companion.as_ref()),
        ProfileField::Interests => !same_interests(&draft.interests, &baseline.interests),
    }
}

fn same_companion(a: Option<&Companion>, b: Option<&Companion>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.id == b.id,
        _ => false,
    }
}

fn same_interests(a: &[Interest], b: &[Interest]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| same_interest(a, b))
}

fn same_interest(a: &Interest, b: &Interest) -> bool {
    match (a, b) {
        (Interest::Freeform(a), Interest::Freeform(b)) => a == b,
        (Interest::Tagged(a), Interest::Tagged(b)) => a.id == b.id && a.value == b.value,
        _ => false,
    }
}
