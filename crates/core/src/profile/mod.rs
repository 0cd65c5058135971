//! Profile synchronization engine
//!
//! Control flow: [`session::ProfileSession::mount`] runs the loader once and
//! seeds draft and baseline identically. UI actions mutate the draft through
//! the session setters, each of which marks the conflict guard. Background
//! reconciliation and explicit saves are the only baseline writers.

pub mod dirty;
pub mod draft;
pub mod guard;
pub mod loader;
pub mod navigation;
pub mod normalize;
pub mod ports;
pub mod reconcile;
pub mod save;
pub mod session;
