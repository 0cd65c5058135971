//! Color theme palette

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Fixed palette of profile color themes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Indigo,
    Emerald,
    Sky,
    Rose,
    Amber,
    Violet,
    Teal,
}

impl_domain_enum_conversions!(Theme {
    Indigo => "indigo",
    Emerald => "emerald",
    Sky => "sky",
    Rose => "rose",
    Amber => "amber",
    Violet => "violet",
    Teal => "teal",
});

impl Theme {
    /// Parse a possibly-missing theme name, falling back to the default for
    /// absent or unknown values.
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}
