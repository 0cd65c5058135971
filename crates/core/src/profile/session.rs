//! Profile session
//!
//! One `ProfileSession` lives for as long as the settings surface is
//! mounted. It owns the draft, the baseline, the conflict guard and the
//! save state behind a single synchronous lock. Network calls are always
//! made with the lock released; results are applied in a fresh critical
//! section that re-checks whatever may have changed in between.
//!
//! Cloning a session is cheap and yields a handle to the same state, so the
//! scheduler, the navigation guard and the presentation layer can share it.

use std::sync::Arc;

use parking_lot::Mutex;
use profilesync_domain::{
    Companion, CompanionCatalog, CompanionId, Interest, ProfileField, ProfileFields,
    ProfileRecord, ProfileSyncError, Result, Theme,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dirty;
use super::draft::{Baseline, DraftBuffer};
use super::guard::ConflictGuard;
use super::loader::{LoadOutcome, ProfileLoader};
use super::ports::RemoteProfileStore;
use super::save::{SaveOutcome, SavePhase, SaveState};

/// What the session knows about the remote record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Presence {
    /// The initial load failed; the next save looks the record up first.
    #[default]
    Unknown,
    /// No record exists yet; the next save creates one.
    Absent,
    Present { record_id: String },
}

impl Presence {
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Present { record_id } => Some(record_id),
            Self::Unknown | Self::Absent => None,
        }
    }

    pub fn exists_on_server(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// Point-in-time view of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub draft: ProfileFields,
    pub baseline: Arc<ProfileFields>,
    pub dirty: bool,
    pub changed_fields: Vec<ProfileField>,
    pub guarded_fields: Vec<ProfileField>,
    pub presence: Presence,
    pub save_phase: SavePhase,
    pub last_save: Option<SaveOutcome>,
    pub load_error: Option<ProfileSyncError>,
}

pub(super) struct SessionState {
    pub(super) draft: DraftBuffer,
    pub(super) baseline: Baseline,
    pub(super) guard: ConflictGuard,
    pub(super) presence: Presence,
    pub(super) save: SaveState,
    pub(super) load_error: Option<ProfileSyncError>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            draft: DraftBuffer::default(),
            baseline: Baseline::default(),
            guard: ConflictGuard::new(),
            presence: Presence::Unknown,
            save: SaveState::default(),
            load_error: None,
        }
    }

    pub(super) fn is_dirty(&self) -> bool {
        dirty::is_dirty(self.draft.fields(), self.baseline.fields())
    }

    /// Seed from a loaded record. Fields the user already touched keep their
    /// draft value.
    fn apply_loaded(&mut self, record: &ProfileRecord) {
        self.baseline.replace(record.fields.clone());
        for field in ProfileField::ALL {
            if !self.guard.is_guarded(field) {
                self.draft.adopt(&record.fields, field);
            }
        }
        self.presence = Presence::Present { record_id: record.record_id.clone() };
        self.load_error = None;
    }
}

pub(super) struct SessionInner {
    pub(super) session_id: Uuid,
    pub(super) user_id: String,
    pub(super) loader: ProfileLoader,
    pub(super) store: Arc<dyn RemoteProfileStore>,
    pub(super) catalog: Arc<CompanionCatalog>,
    pub(super) state: Mutex<SessionState>,
    dirty_tx: watch::Sender<bool>,
    cancel: CancellationToken,
}

/// Shared handle to one mounted profile surface.
#[derive(Clone)]
pub struct ProfileSession {
    pub(super) inner: Arc<SessionInner>,
}

impl std::fmt::Debug for ProfileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSession")
            .field("session_id", &self.inner.session_id)
            .field("user_id", &self.inner.user_id)
            .field("detached", &self.is_detached())
            .finish_non_exhaustive()
    }
}

impl ProfileSession {
    /// Create an unloaded session with default draft and baseline.
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn RemoteProfileStore>,
        catalog: Arc<CompanionCatalog>,
    ) -> Self {
        let (dirty_tx, _) = watch::channel(false);
        let loader = ProfileLoader::new(Arc::clone(&store), Arc::clone(&catalog));
        Self {
            inner: Arc::new(SessionInner {
                session_id: Uuid::now_v7(),
                user_id: user_id.into(),
                loader,
                store,
                catalog,
                state: Mutex::new(SessionState::new()),
                dirty_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Create a session and run the initial load.
    ///
    /// A failed load does not fail the mount: the session stays usable with
    /// default values, [`Presence::Unknown`], and the error in
    /// [`SessionSnapshot::load_error`].
    pub async fn mount(
        user_id: impl Into<String>,
        store: Arc<dyn RemoteProfileStore>,
        catalog: Arc<CompanionCatalog>,
    ) -> Self {
        let session = Self::new(user_id, store, catalog);
        if let Ok(outcome) = session.load().await {
            debug!(
                session_id = %session.inner.session_id,
                found = outcome.found(),
                "profile session mounted"
            );
        }
        session
    }

    /// Run (or re-run) the loader and seed draft and baseline from it.
    ///
    /// A result whose fetch overlapped a save is returned but not applied.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Detached` after unmount, or the loader's
    /// error. Load errors are also recorded on the session.
    pub async fn load(&self) -> Result<LoadOutcome> {
        self.ensure_attached()?;
        let generation = self.inner.state.lock().save.generation;
        let result = self.inner.loader.load(&self.inner.user_id).await;
        self.ensure_attached()?;

        let mut state = self.inner.state.lock();
        if state.save.phase == SavePhase::Saving {
            debug!(user_id = %self.inner.user_id, "save in flight; discarding load result");
            return result;
        }
        if state.save.generation != generation {
            debug!(user_id = %self.inner.user_id, "save completed during load; discarding result");
            return result;
        }

        match &result {
            Ok(LoadOutcome::Found(record)) => state.apply_loaded(record),
            Ok(LoadOutcome::NotFound) => {
                state.presence = Presence::Absent;
                state.load_error = None;
            }
            Err(err) => {
                warn!(
                    user_id = %self.inner.user_id,
                    error = %err,
                    error_kind = err.label(),
                    "profile load failed; keeping defaults"
                );
                state.load_error = Some(err.clone());
            }
        }
        self.publish_dirty(&state);
        drop(state);

        result
    }

    /// Detach the session. Pending network results are discarded, setters
    /// and saves fail with `Detached`, and background tasks stop.
    pub fn unmount(&self) {
        if !self.inner.cancel.is_cancelled() {
            info!(session_id = %self.inner.session_id, "profile session unmounted");
        }
        self.inner.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Token cancelled when the session unmounts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub fn catalog(&self) -> &CompanionCatalog {
        &self.inner.catalog
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// # Errors
    /// Returns `ProfileSyncError::Detached` after unmount.
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.edit(move |draft| Ok(draft.set_name(name)))
    }

    /// # Errors
    /// Returns `ProfileSyncError::Detached` after unmount.
    pub fn set_tts_enabled(&self, enabled: bool) -> Result<()> {
        self.edit(|draft| Ok(draft.set_tts_enabled(enabled)))
    }

    /// # Errors
    /// Returns `ProfileSyncError::Detached` after unmount.
    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.edit(|draft| Ok(draft.set_theme(theme)))
    }

    /// Look up a catalog companion for the preview modal. The draft is not
    /// touched until [`Self::set_companion`] confirms the choice.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Validation` if `id` is not in the catalog.
    pub fn preview_companion(&self, id: CompanionId) -> Result<Companion> {
        self.inner
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| ProfileSyncError::Validation(format!("companion {id} is not in the catalog")))
    }

    /// Confirm a companion choice.
    ///
    /// # Errors
    /// Returns `ProfileSyncError::Validation` if `id` is not in the catalog,
    /// or `ProfileSyncError::Detached` after unmount.
    pub fn set_companion(&self, id: CompanionId) -> Result<Companion> {
        let companion = self.preview_companion(id)?;
        let selected = companion.clone();
        self.edit(move |draft| Ok(draft.set_companion(selected)))?;
        Ok(companion)
    }

    /// # Errors
    /// Returns `ProfileSyncError::Validation` for a rejected entry, or
    /// `ProfileSyncError::Detached` after unmount.
    pub fn add_interest(&self, interest: Interest) -> Result<()> {
        self.edit(|draft| draft.add_interest(interest))
    }

    /// # Errors
    /// Returns `ProfileSyncError::Validation` if `index` is out of range, or
    /// `ProfileSyncError::Detached` after unmount.
    pub fn remove_interest(&self, index: usize) -> Result<Interest> {
        let mut removed = None;
        self.edit(|draft| {
            removed = Some(draft.remove_interest(index)?);
            Ok(ProfileField::Interests)
        })?;
        removed.ok_or_else(|| ProfileSyncError::Internal("interest removal lost its entry".into()))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.inner.state.lock().is_dirty()
    }

    pub fn changed_fields(&self) -> Vec<ProfileField> {
        let state = self.inner.state.lock();
        dirty::changed_fields(state.draft.fields(), state.baseline.fields())
    }

    pub fn draft(&self) -> ProfileFields {
        self.inner.state.lock().draft.fields().clone()
    }

    pub fn baseline(&self) -> Arc<ProfileFields> {
        self.inner.state.lock().baseline.snapshot()
    }

    pub fn presence(&self) -> Presence {
        self.inner.state.lock().presence.clone()
    }

    pub fn has_uncommitted_local_change(&self) -> bool {
        self.inner.state.lock().guard.has_uncommitted_local_change()
    }

    pub fn guarded_fields(&self) -> Vec<ProfileField> {
        self.inner.state.lock().guard.guarded_fields()
    }

    pub fn save_phase(&self) -> SavePhase {
        self.inner.state.lock().save.phase
    }

    /// Receiver that observes every dirty/clean transition.
    pub fn dirty_watch(&self) -> watch::Receiver<bool> {
        self.inner.dirty_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock();
        let changed_fields = dirty::changed_fields(state.draft.fields(), state.baseline.fields());
        SessionSnapshot {
            session_id: self.inner.session_id,
            draft: state.draft.fields().clone(),
            baseline: state.baseline.snapshot(),
            dirty: !changed_fields.is_empty(),
            changed_fields,
            guarded_fields: state.guard.guarded_fields(),
            presence: state.presence.clone(),
            save_phase: state.save.phase,
            last_save: state.save.last_outcome.clone(),
            load_error: state.load_error.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Internals shared with save and reconcile
    // ------------------------------------------------------------------

    pub(super) fn ensure_attached(&self) -> Result<()> {
        if self.is_detached() {
            return Err(ProfileSyncError::Detached);
        }
        Ok(())
    }

    /// Publish the current dirty flag. Call with the state lock held so
    /// transitions are observed in order.
    pub(super) fn publish_dirty(&self, state: &SessionState) {
        let dirty = state.is_dirty();
        self.inner.dirty_tx.send_if_modified(|current| {
            if *current == dirty {
                false
            } else {
                *current = dirty;
                true
            }
        });
    }

    fn edit<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut DraftBuffer) -> Result<ProfileField>,
    {
        self.ensure_attached()?;
        let mut state = self.inner.state.lock();
        let field = apply(&mut state.draft)?;
        state.guard.mark(field);
        self.publish_dirty(&state);
        Ok(())
    }
}
