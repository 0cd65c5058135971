//! # ProfileSync Core
//!
//! Pure synchronization logic - no HTTP, no timers of its own.
//!
//! This crate contains:
//! - Port interfaces (traits) for the remote store and the presentation layer
//! - Response normalization and the profile loader
//! - Draft/baseline state, dirty detection and the conflict guard
//! - The profile session (save and reconciliation) and the navigation guard
//!
//! ## Architecture Principles
//! - Only depends on `profilesync-domain`
//! - All external collaborators via traits
//! - Session state is only ever locked synchronously; no lock is held across
//!   a network call

pub mod profile;

// Re-export specific items to avoid ambiguity
pub use profile::dirty::{changed_fields, is_dirty};
pub use profile::loader::{LoadOutcome, ProfileLoader};
pub use profile::navigation::{NavigationGuard, NavigationVerdict};
pub use profile::ports::{LeaveDecision, LeavePrompt, RemoteProfileStore, UnloadInterceptor};
pub use profile::reconcile::{ReconcileOutcome, ReconcileTrigger, SkipReason};
pub use profile::save::{SaveAck, SaveOutcome, SavePhase};
pub use profile::session::{Presence, ProfileSession, SessionSnapshot};
