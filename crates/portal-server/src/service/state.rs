//! Application state and dependency injection.

use std::sync::Arc;

use crate::service::identity::{IdentityProvider, RedirectPolicy};
use crate::service::security::SessionKeys;
use crate::service::store::{PgAccountStore, SharedAccountStore};
use crate::service::{Result, ServiceConfig};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub account_store: SharedAccountStore,
    pub identity_provider: IdentityProvider,

    // Internal services:
    pub session_keys: SessionKeys,
    pub redirect_policy: RedirectPolicy,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres, applies migrations and loads the signing keys.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let session_keys = config.load_session_keys()?;
        let redirect_policy = config.redirect_policy()?;
        let identity_provider = config.identity_provider()?;
        let pg_client = config.connect_postgres().await?;

        Ok(Self::new(
            Arc::new(PgAccountStore::new(pg_client)),
            identity_provider,
            session_keys,
            redirect_policy,
        ))
    }

    /// Assembles state from already constructed services.
    pub fn new(
        account_store: SharedAccountStore,
        identity_provider: IdentityProvider,
        session_keys: SessionKeys,
        redirect_policy: RedirectPolicy,
    ) -> Self {
        Self {
            account_store,
            identity_provider,
            session_keys,
            redirect_policy,
        }
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("identity_provider", &self.identity_provider)
            .field("session_keys", &self.session_keys)
            .field("redirect_policy", &self.redirect_policy)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(account_store: SharedAccountStore);
impl_di!(identity_provider: IdentityProvider);

// Internal services:
impl_di!(session_keys: SessionKeys);
impl_di!(redirect_policy: RedirectPolicy);
