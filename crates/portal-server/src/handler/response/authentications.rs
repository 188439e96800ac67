//! Session and permission introspection responses.

use portal_postgres::types::UserRole;
use serde::{Deserialize, Serialize};

use crate::extract::{EffectivePermissions, Session};

/// Public view of the current session.
///
/// The upstream access token is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Portal user identifier.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Network identifier.
    pub cid: Option<String>,
    /// Resolved role.
    pub role: UserRole,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.user_id.clone(),
            name: session.display_name.clone(),
            cid: session.network_id.clone(),
            role: session.role,
        }
    }
}

/// Effective permissions of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsResponse {
    /// Resolved role.
    pub role: UserRole,
    /// Whether every permission is implied by the role.
    pub all: bool,
    /// Explicitly granted permission keys, sorted.
    pub permissions: Vec<String>,
}

impl PermissionsResponse {
    /// Builds the response for a role and its effective permissions.
    pub fn new(role: UserRole, effective: EffectivePermissions) -> Self {
        match effective {
            EffectivePermissions::All => Self {
                role,
                all: true,
                permissions: Vec::new(),
            },
            EffectivePermissions::Granted(granted) => Self {
                role,
                all: false,
                permissions: granted.into_iter().collect(),
            },
        }
    }
}
