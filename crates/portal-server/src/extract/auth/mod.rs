//! Session and permission extraction.
//!
//! # Key Types
//!
//! - [`SessionClaims`] - Claims embedded in the session token
//! - [`Session`] - Verified session with resolved role, usable as an extractor
//! - [`StaffPermission`] - Known back-office permission keys
//! - [`EffectivePermissions`] - What a session may do

mod permission;
mod session;
mod session_claims;

pub use self::permission::{
    EffectivePermissions, StaffPermission, effective_permissions, has_permission,
    require_permission,
};
pub use self::session::{Session, resolve_session};
pub use self::session_claims::{
    IssuedSession, SESSION_COOKIE, SessionClaims, SessionIdentity, destroy_session,
    issue_session, issue_session_at,
};
