//! # ProfileSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The HTTP client with retry and backoff
//! - The remote profile API client and the `RemoteProfileStore` adapter
//! - The background reconciliation scheduler
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `profilesync-core`
//! - Contains all "impure" code (network I/O, timers, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    AccessTokenProvider, ApiClient, ApiClientConfig, ApiError, HttpProfileStore,
    ReconciliationScheduler, SchedulerConfig, StaticTokenProvider, TriggerHandle,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
