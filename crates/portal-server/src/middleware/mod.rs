//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Session and permission enforcement for route groups
//! - Observability (tracing spans, request IDs, sensitive headers)
//! - Recovery (panics, timeouts, service errors)
//!
//! ```rust,no_run
//! use axum::Router;
//! use portal_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
//!
//! let app: Router = Router::new()
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod auth;
mod observability;
mod recovery;

pub use auth::{RequiredPermission, require_session, require_staff_permission};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
