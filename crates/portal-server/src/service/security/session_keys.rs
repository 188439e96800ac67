//! Session signing keys and cookie policy.
//!
//! Sessions are HS256 tokens signed with a server-held secret. The secret is
//! validated once at startup so that issuing a token never fails afterwards.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use jiff::SignedDuration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::utility::tracing_targets::TRACING_TARGET_SESSION_KEYS as TRACING_TARGET;
use crate::{Error, Result};

/// Issuer claim of every session token.
pub(crate) const SESSION_ISSUER: &str = "division-portal";
/// Audience claim of every session token.
pub(crate) const SESSION_AUDIENCE: &str = "division-portal:web";

/// Minimum accepted secret length in bytes.
const MIN_SECRET_LEN: usize = 32;
/// Default session lifetime (6 hours).
const DEFAULT_TTL_SECS: u64 = 6 * 60 * 60;
/// Longest accepted session lifetime (366 days).
const MAX_TTL_SECS: u64 = 366 * 24 * 60 * 60;

/// Session signing configuration.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct SessionKeysConfig {
    /// HMAC secret used to sign session tokens (at least 32 bytes).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SESSION_SECRET", hide_env_values = true)
    )]
    pub session_secret: String,

    /// Lifetime of a session in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SESSION_TTL_SECS", default_value = "21600")
    )]
    #[serde(default = "SessionKeysConfig::default_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl SessionKeysConfig {
    /// Creates a configuration with the default lifetime.
    pub fn new(session_secret: impl Into<String>) -> Self {
        Self {
            session_secret: session_secret.into(),
            session_ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    fn default_ttl_secs() -> u64 {
        DEFAULT_TTL_SECS
    }
}

impl fmt::Debug for SessionKeysConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeysConfig")
            .field("session_secret", &"***")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

/// Keys and policy used to issue and verify session cookies.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<SessionKeysInner>,
}

struct SessionKeysInner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
    secure_cookies: bool,
}

impl SessionKeys {
    /// Creates session keys from a raw secret.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is shorter than 32 bytes
    /// or the lifetime is zero or longer than 366 days.
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64, secure_cookies: bool) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            tracing::error!(
                target: TRACING_TARGET,
                secret_len = secret.len(),
                min_len = MIN_SECRET_LEN,
                "Session secret is too short"
            );
            return Err(Error::config(format!(
                "SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        if !(1..=MAX_TTL_SECS).contains(&ttl_secs) {
            tracing::error!(
                target: TRACING_TARGET,
                ttl_secs,
                max_ttl_secs = MAX_TTL_SECS,
                "Session lifetime is out of range"
            );
            return Err(Error::config(format!(
                "SESSION_TTL_SECS must be between 1 and {MAX_TTL_SECS}"
            )));
        }

        tracing::info!(
            target: TRACING_TARGET,
            ttl_secs,
            secure_cookies,
            "Session keys loaded"
        );

        Ok(Self {
            inner: Arc::new(SessionKeysInner {
                encoding_key: EncodingKey::from_secret(secret),
                decoding_key: DecodingKey::from_secret(secret),
                ttl_secs,
                secure_cookies,
            }),
        })
    }

    /// Creates session keys from configuration.
    pub fn from_config(config: &SessionKeysConfig, secure_cookies: bool) -> Result<Self> {
        Self::new(
            config.session_secret.as_bytes(),
            config.session_ttl_secs,
            secure_cookies,
        )
    }

    /// Returns the key used to sign tokens.
    #[inline]
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.inner.encoding_key
    }

    /// Returns the key used to verify tokens.
    #[inline]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.inner.decoding_key
    }

    /// Returns the session lifetime.
    #[inline]
    pub fn ttl(&self) -> SignedDuration {
        // Range checked in the constructor.
        SignedDuration::from_secs(self.inner.ttl_secs as i64)
    }

    /// Returns the session lifetime in seconds.
    #[inline]
    pub fn ttl_secs(&self) -> u64 {
        self.inner.ttl_secs
    }

    /// Returns whether session cookies carry the `Secure` attribute.
    #[inline]
    pub fn secure_cookies(&self) -> bool {
        self.inner.secure_cookies
    }

    /// Returns the strict validation applied to incoming tokens.
    pub(crate) fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.set_audience(&[SESSION_AUDIENCE]);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);
        validation
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_secs", &self.inner.ttl_secs)
            .field("secure_cookies", &self.inner.secure_cookies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn accepts_long_secret() {
        let keys = SessionKeys::new(SECRET, 21_600, true).unwrap();
        assert_eq!(keys.ttl(), SignedDuration::from_hours(6));
        assert!(keys.secure_cookies());
    }

    #[test]
    fn rejects_short_secret() {
        let error = SessionKeys::new("too-short", 21_600, false).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn rejects_zero_ttl() {
        assert!(SessionKeys::new(SECRET, 0, false).is_err());
    }

    #[test]
    fn rejects_out_of_range_ttl() {
        let error = SessionKeys::new(SECRET, 300_000_000_000, false).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(SessionKeys::new(SECRET, MAX_TTL_SECS + 1, false).is_err());
        assert!(SessionKeys::new(SECRET, MAX_TTL_SECS, false).is_ok());
    }

    #[test]
    fn debug_hides_secret() {
        let config = SessionKeysConfig::new(SECRET);
        assert!(!format!("{config:?}").contains(SECRET));
        assert_eq!(config.session_ttl_secs, 21_600);
    }
}
