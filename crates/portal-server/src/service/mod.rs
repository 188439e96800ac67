//! Application state and dependency injection.

mod config;
mod state;

pub mod identity;
pub mod security;
pub mod store;

pub use crate::service::config::{Environment, ServiceConfig};
pub use crate::service::identity::{
    ExchangedIdentity, IdentityClaims, IdentityConfig, IdentityProvider, RedirectPolicy,
};
pub use crate::service::security::{SessionKeys, SessionKeysConfig};
pub use crate::service::state::ServiceState;
pub use crate::service::store::{
    Account, AccountStore, InMemoryAccountStore, PgAccountStore, SharedAccountStore,
};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};
