//! User and permission store seam.
//!
//! The session and permission layer only ever talks to an [`AccountStore`].
//! Production wires in [`PgAccountStore`]; tests use [`InMemoryAccountStore`].

mod memory_store;
mod pg_store;

use std::sync::Arc;

use portal_postgres::model::User;
use portal_postgres::types::UserRole;
use serde::{Deserialize, Serialize};

pub use self::memory_store::InMemoryAccountStore;
pub use self::pg_store::PgAccountStore;
use crate::Result;
use crate::service::identity::IdentityClaims;

/// A portal account as seen by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Portal-local identifier, used as the session subject.
    pub id: String,
    /// Identifier on the flight-simulation network.
    pub network_id: String,
    /// Full name.
    pub display_name: Option<String>,
    /// Portal-wide role.
    pub role: UserRole,
}

impl From<User> for Account {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            network_id: user.network_id,
            display_name: user.display_name,
            role: user.role,
        }
    }
}

/// Read and write access to accounts and their staff permissions.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up the role of a user.
    ///
    /// Returns `None` when the user does not exist.
    async fn find_role(&self, user_id: &str) -> Result<Option<UserRole>>;

    /// Lists the staff permission keys granted to a user.
    async fn find_permissions(&self, user_id: &str) -> Result<Vec<String>>;

    /// Creates the account for a freshly signed-in identity, or refreshes the
    /// profile of the existing one keyed by network identifier.
    async fn upsert_account(&self, claims: &IdentityClaims) -> Result<Account>;
}

/// Shared, type-erased store handle injected through the service state.
pub type SharedAccountStore = Arc<dyn AccountStore>;
