//! Interest entries
//!
//! Students add freeform interests by hand; the onboarding flow assigns
//! tagged "focus topics" that carry an id and an optional prompt.

use serde::{Deserialize, Serialize};

/// A single interest entry, either a bare string or a tagged object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Interest {
    Freeform(String),
    Tagged(TaggedInterest),
}

/// Interest assigned by the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedInterest {
    pub id: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Interest {
    pub fn freeform(value: impl Into<String>) -> Self {
        Self::Freeform(value.into())
    }

    pub fn tagged(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Tagged(TaggedInterest { id: id.into(), value: value.into(), prompt: None })
    }

    pub fn is_focus_topic(&self) -> bool {
        matches!(self, Self::Tagged(_))
    }
}
