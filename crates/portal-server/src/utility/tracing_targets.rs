//! Centralized tracing target constants for structured logging.
//!
//! Using consistent targets enables fine-grained control over log output
//! via tracing subscriber filters, e.g. `RUST_LOG=portal_server::authorization=debug`.

/// Session issuance, verification and role resolution.
pub const TRACING_TARGET_AUTHENTICATION: &str = "portal_server::authentication";

/// Permission checks and access control decisions.
pub const TRACING_TARGET_AUTHORIZATION: &str = "portal_server::authorization";

/// Identity provider exchanges and redirect sanitization.
pub const TRACING_TARGET_IDENTITY: &str = "portal_server::identity";

/// Session key loading and validation.
pub const TRACING_TARGET_SESSION_KEYS: &str = "portal_server::session_keys";

/// Account store calls.
pub const TRACING_TARGET_STORE: &str = "portal_server::store";

/// Error recovery including middleware errors and request failures.
pub const TRACING_TARGET_RECOVERY_ERROR: &str = "portal_server::recovery::error";

/// Panic recovery including handler panics.
pub const TRACING_TARGET_RECOVERY_PANIC: &str = "portal_server::recovery::panic";
