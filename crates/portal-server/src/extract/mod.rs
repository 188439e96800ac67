//! Request extractors.
//!
//! - [`Session`] resolves the session cookie, rejecting with 401 when there
//!   is none; `Option<Session>` never rejects.
//! - The permission gate functions combine a session with the staff
//!   permissions held in the account store.

pub mod auth;

pub use crate::extract::auth::{
    EffectivePermissions, IssuedSession, SESSION_COOKIE, Session, SessionClaims,
    SessionIdentity, StaffPermission, destroy_session, effective_permissions, has_permission,
    issue_session, issue_session_at, require_permission, resolve_session,
};
