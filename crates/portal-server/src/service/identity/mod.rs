//! Identity provider bridge.
//!
//! Exchanges an OAuth authorization code for the caller's network identity
//! and keeps every post-login destination on the portal's own origin.

mod provider;
mod redirect;

pub use provider::{ExchangedIdentity, IdentityClaims, IdentityConfig, IdentityProvider};
pub use redirect::{RedirectPolicy, sanitize_redirect};

#[cfg(test)]
pub(crate) use provider::tests::{TEST_CODE, spawn_fake_provider};
