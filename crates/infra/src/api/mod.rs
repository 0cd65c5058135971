//! Remote profile API
//!
//! HTTP access to the profile record service and the background loop that
//! keeps a mounted session reconciled with it.
//!
//! - [`ApiClient`] wraps [`crate::http::HttpClient`] with auth, per-call
//!   timeouts and status classification.
//! - [`HttpProfileStore`] implements the core store port on top of it.
//! - [`ReconciliationScheduler`] feeds interval, visibility and focus
//!   triggers into the session.

pub mod auth;
pub mod client;
pub mod errors;
pub mod scheduler;
pub mod store;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use client::{ApiClient, ApiClientConfig};
pub use errors::ApiError;
pub use scheduler::{ReconciliationScheduler, SchedulerConfig, TriggerHandle};
pub use store::HttpProfileStore;
