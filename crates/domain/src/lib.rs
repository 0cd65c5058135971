//! # ProfileSync Domain
//!
//! Business domain types for the student profile synchronization engine.
//!
//! This crate contains:
//! - Profile data types (ProfileFields, ProfileRecord, Companion, Interest)
//! - Wire payloads sent to the remote profile store
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other ProfileSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
