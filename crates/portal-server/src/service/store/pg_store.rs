//! Postgres-backed account store.

use portal_postgres::PgClient;
use portal_postgres::model::NewUser;
use portal_postgres::query::{StaffPermissionRepository, UserRepository};
use portal_postgres::types::UserRole;
use uuid::Uuid;

use super::{Account, AccountStore};
use crate::Result;
use crate::service::identity::IdentityClaims;
use crate::utility::tracing_targets::TRACING_TARGET_STORE;

/// [`AccountStore`] backed by the Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pg_client: PgClient,
}

impl PgAccountStore {
    /// Creates a store over an existing client.
    pub fn new(pg_client: PgClient) -> Self {
        Self { pg_client }
    }
}

#[async_trait::async_trait]
impl AccountStore for PgAccountStore {
    async fn find_role(&self, user_id: &str) -> Result<Option<UserRole>> {
        let mut conn = self.pg_client.get_connection().await?;
        let role = conn.find_user_role(user_id).await?;

        tracing::trace!(
            target: TRACING_TARGET_STORE,
            user_id,
            found = role.is_some(),
            "Role looked up"
        );

        Ok(role)
    }

    async fn find_permissions(&self, user_id: &str) -> Result<Vec<String>> {
        let mut conn = self.pg_client.get_connection().await?;
        let permissions = conn.list_user_permissions(user_id).await?;
        Ok(permissions)
    }

    async fn upsert_account(&self, claims: &IdentityClaims) -> Result<Account> {
        let new_user = NewUser {
            id: Uuid::now_v7().to_string(),
            network_id: claims.subject.clone(),
            display_name: claims.name.clone(),
            email_address: claims.email.clone(),
        };

        let mut conn = self.pg_client.get_connection().await?;
        let user = conn.upsert_user(new_user).await?;
        Ok(user.into())
    }
}
