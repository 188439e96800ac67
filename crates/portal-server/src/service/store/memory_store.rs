//! In-memory account store used by tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use portal_postgres::types::UserRole;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Account, AccountStore};
use crate::service::identity::IdentityClaims;
use crate::utility::tracing_targets::TRACING_TARGET_STORE;
use crate::{Error, Result};

/// [`AccountStore`] kept in process memory.
///
/// Used by tests and local development. Counts role lookups so that callers
/// can assert how often the session layer fell back to the store, and can be
/// switched into a failing mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    inner: Arc<InMemoryInner>,
}

#[derive(Debug, Default)]
struct InMemoryInner {
    accounts: RwLock<HashMap<String, Account>>,
    permissions: RwLock<HashMap<String, BTreeSet<String>>>,
    role_lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an account.
    pub async fn insert_account(&self, account: Account) {
        let mut accounts = self.inner.accounts.write().await;
        accounts.insert(account.id.clone(), account);
    }

    /// Inserts a minimal account with the given role.
    pub async fn insert_user(&self, user_id: &str, role: UserRole) {
        self.insert_account(Account {
            id: user_id.to_owned(),
            network_id: user_id.to_owned(),
            display_name: None,
            role,
        })
        .await;
    }

    /// Grants a permission key to a user.
    pub async fn grant(&self, user_id: &str, permission: impl Into<String>) {
        let mut permissions = self.inner.permissions.write().await;
        permissions
            .entry(user_id.to_owned())
            .or_default()
            .insert(permission.into());
    }

    /// Number of [`find_role`] calls served so far.
    ///
    /// [`find_role`]: AccountStore::find_role
    pub fn role_lookups(&self) -> usize {
        self.inner.role_lookups.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(Error::external("account store", "store is unavailable"));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_role(&self, user_id: &str) -> Result<Option<UserRole>> {
        self.inner.role_lookups.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let accounts = self.inner.accounts.read().await;
        Ok(accounts.get(user_id).map(|account| account.role))
    }

    async fn find_permissions(&self, user_id: &str) -> Result<Vec<String>> {
        self.ensure_available()?;

        let permissions = self.inner.permissions.read().await;
        Ok(permissions
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_account(&self, claims: &IdentityClaims) -> Result<Account> {
        self.ensure_available()?;

        let mut accounts = self.inner.accounts.write().await;
        let existing = accounts
            .values_mut()
            .find(|account| account.network_id == claims.subject);

        let account = match existing {
            Some(account) => {
                account.display_name = claims.name.clone();
                account.clone()
            }
            None => {
                let account = Account {
                    id: Uuid::now_v7().to_string(),
                    network_id: claims.subject.clone(),
                    display_name: claims.name.clone(),
                    role: UserRole::default(),
                };
                accounts.insert(account.id.clone(), account.clone());
                account
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            user_id = %account.id,
            network_id = %account.network_id,
            "Account upserted"
        );

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(subject: &str, name: &str) -> IdentityClaims {
        IdentityClaims {
            subject: subject.to_owned(),
            name: Some(name.to_owned()),
            email: None,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_id_and_role() -> anyhow::Result<()> {
        let store = InMemoryAccountStore::new();
        let created = store.upsert_account(&claims("1234567", "Ana")).await?;
        assert_eq!(created.role, UserRole::User);

        store
            .insert_account(Account {
                role: UserRole::Staff,
                ..created.clone()
            })
            .await;

        let refreshed = store.upsert_account(&claims("1234567", "Ana Silva")).await?;
        assert_eq!(refreshed.id, created.id);
        assert_eq!(refreshed.role, UserRole::Staff);
        assert_eq!(refreshed.display_name.as_deref(), Some("Ana Silva"));
        Ok(())
    }

    #[tokio::test]
    async fn counts_role_lookups() -> anyhow::Result<()> {
        let store = InMemoryAccountStore::new();
        store.insert_user("u1", UserRole::Admin).await;

        assert_eq!(store.find_role("u1").await?, Some(UserRole::Admin));
        assert_eq!(store.find_role("nobody").await?, None);
        assert_eq!(store.role_lookups(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_store_fails() {
        let store = InMemoryAccountStore::new();
        store.set_unavailable(true);

        assert!(store.find_role("u1").await.is_err());
        assert!(store.find_permissions("u1").await.is_err());
    }

    #[tokio::test]
    async fn permissions_are_sorted() -> anyhow::Result<()> {
        let store = InMemoryAccountStore::new();
        store.grant("u1", "admin:users").await;
        store.grant("u1", "admin:events").await;

        assert_eq!(
            store.find_permissions("u1").await?,
            vec!["admin:events".to_owned(), "admin:users".to_owned()]
        );
        assert!(store.find_permissions("u2").await?.is_empty());
        Ok(())
    }
}
