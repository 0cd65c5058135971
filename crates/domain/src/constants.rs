//! Engine constants
//!
//! Centralized location for domain-level constants.

// Profile limits
pub const MAX_FOCUS_TOPICS: usize = 2;
pub const MAX_NAME_LENGTH: usize = 60;

// Reconciliation
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

// Remote API defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_MAX_ATTEMPTS: usize = 3;
pub const RECORDS_PATH: &str = "/records";
pub const RECORD_PATH: &str = "/record";
pub const MATCHING_QUERY_PARAM: &str = "matching";

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
