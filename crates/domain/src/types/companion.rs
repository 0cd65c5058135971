//! Companion catalog
//!
//! Companions are picked from a fixed catalog, never entered freely. Any
//! companion reference whose id is not in the catalog is treated as corrupt
//! and replaced with the catalog default.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProfileSyncError, Result};

/// Identifier of a catalog companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanionId(pub u32);

impl fmt::Display for CompanionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved catalog companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub id: CompanionId,
    pub name: String,
    pub image_ref: String,
}

impl Companion {
    pub fn new(id: u32, name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self { id: CompanionId(id), name: name.into(), image_ref: image_ref.into() }
    }
}

/// The fixed set of selectable companions. The first entry is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionCatalog {
    entries: Vec<Companion>,
}

impl CompanionCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Config` if `entries` is empty or contains
    /// duplicate ids.
    pub fn new(entries: Vec<Companion>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ProfileSyncError::Config("companion catalog is empty".into()));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(ProfileSyncError::Config(format!(
                    "duplicate companion id {} in catalog",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The catalog shipped with the student portal.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                Companion::new(1, "Pip the Owl", "companions/pip-owl.png"),
                Companion::new(2, "Nova the Fox", "companions/nova-fox.png"),
                Companion::new(3, "Bolt the Robot", "companions/bolt-robot.png"),
                Companion::new(4, "Luna the Cat", "companions/luna-cat.png"),
                Companion::new(5, "Sprout the Dragon", "companions/sprout-dragon.png"),
                Companion::new(6, "Echo the Dolphin", "companions/echo-dolphin.png"),
            ],
        }
    }

    pub fn default_companion(&self) -> &Companion {
        // `new` and `builtin` both guarantee at least one entry.
        &self.entries[0]
    }

    pub fn get(&self, id: CompanionId) -> Option<&Companion> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

impl Default for CompanionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
