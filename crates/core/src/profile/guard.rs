//! Conflict guard
//!
//! Tracks which fields carry an uncommitted local edit. A background
//! reconciliation must never overwrite a guarded field; it may only adopt
//! server values for fields the user has not touched since the last
//! successful save.
//!
//! Each edit records a monotonically increasing mark. A save takes a
//! [`GuardCheckpoint`] before sending and, on success, clears only marks
//! taken before that checkpoint. Edits made while the request was in
//! flight stay guarded.

use std::collections::BTreeMap;

use profilesync_domain::ProfileField;

/// Position in the edit sequence at the moment a save started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GuardCheckpoint(u64);

#[derive(Debug, Default, Clone)]
pub struct ConflictGuard {
    marks: BTreeMap<ProfileField, u64>,
    next_mark: u64,
}

impl ConflictGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a local edit of `field`.
    pub fn mark(&mut self, field: ProfileField) {
        self.next_mark += 1;
        self.marks.insert(field, self.next_mark);
    }

    pub fn is_guarded(&self, field: ProfileField) -> bool {
        self.marks.contains_key(&field)
    }

    /// Whether any field carries an edit not yet committed by a save.
    pub fn has_uncommitted_local_change(&self) -> bool {
        !self.marks.is_empty()
    }

    /// Guarded fields in declaration order.
    pub fn guarded_fields(&self) -> Vec<ProfileField> {
        self.marks.keys().copied().collect()
    }

    pub fn checkpoint(&self) -> GuardCheckpoint {
        GuardCheckpoint(self.next_mark)
    }

    /// Drop marks recorded at or before `checkpoint`.
    ///
    /// Only a successful save may lift the guard.
    pub(super) fn clear_through(&mut self, checkpoint: GuardCheckpoint) {
        self.marks.retain(|_, mark| *mark > checkpoint.0);
    }
}
