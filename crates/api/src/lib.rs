//! # ProfileSync App
//!
//! Composition root for the profile settings screen.
//!
//! This crate contains:
//! - [`ProfileSettingsContext`], which wires configuration, the HTTP store,
//!   the profile session, the reconciliation scheduler and the navigation
//!   guard together for one mounted settings screen
//! - Logging helpers for user-facing operations
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Owns the lifetime of everything it builds: unmounting the context
//!   detaches the session and stops its background work

pub mod context;
pub mod utils;

pub use context::*;
