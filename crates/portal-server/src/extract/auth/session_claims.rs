//! Session token claims, issuance and the session cookie.
//!
//! A session is a compact HS256 token stored in the [`SESSION_COOKIE`]
//! cookie. Registered claims (`iss`, `aud`, `sub`, `iat`, `exp`) are checked
//! on every request with zero leeway; the private claims carry the identity
//! and, for tokens minted after role embedding, the role.

use std::fmt;

use axum_extra::extract::cookie::{Cookie, SameSite};
use jiff::Timestamp;
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{Algorithm, Header, decode, encode};
use portal_postgres::types::UserRole;
use serde::{Deserialize, Serialize};

use crate::service::SessionKeys;
use crate::service::security::{SESSION_AUDIENCE, SESSION_ISSUER};
use crate::utility::tracing_targets::TRACING_TARGET_AUTHENTICATION;
use crate::{Error, Result};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "portal_session";

/// Claims embedded in a session token.
///
/// | Claim  | Field          | Description                    |
/// |--------|----------------|--------------------------------|
/// | `iss`  | -              | Always `division-portal`       |
/// | `aud`  | -              | Always `division-portal:web`   |
/// | `sub`  | `user_id`      | Portal user identifier         |
/// | `iat`  | `issued_at`    | Issue instant, seconds         |
/// | `exp`  | `expires_at`   | Expiry instant, seconds        |
/// | `cid`  | `network_id`   | Network identifier             |
/// | `name` | `display_name` | Full name                      |
/// | `role` | `role`         | Portal-wide role               |
/// | `uat`  | `access_token` | Upstream provider access token |
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "iss")]
    issued_by: String,
    #[serde(rename = "aud")]
    audience: String,

    /// Subject (portal user identifier).
    #[serde(rename = "sub")]
    pub user_id: String,
    /// Issued at.
    #[serde(rename = "iat", with = "jiff::fmt::serde::timestamp::second::required")]
    pub issued_at: Timestamp,
    /// Expiration time.
    #[serde(rename = "exp", with = "jiff::fmt::serde::timestamp::second::required")]
    pub expires_at: Timestamp,

    /// Network identifier.
    #[serde(rename = "cid", default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Display name.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Role; absent in tokens minted before roles were embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Upstream access token.
    #[serde(rename = "uat", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl SessionClaims {
    /// Verifies a compact token and returns its claims.
    ///
    /// Checks signature, issuer, audience and expiration with zero leeway.
    pub fn decode(keys: &SessionKeys, token: &str) -> Result<Self, JwtError> {
        decode::<Self>(token, keys.decoding_key(), &keys.validation()).map(|data| data.claims)
    }

    /// Returns whether the token has expired at the given instant.
    #[inline]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at < now
    }
}

impl fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClaims")
            .field("user_id", &self.user_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("network_id", &self.network_id)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Identity to embed in a new session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Portal user identifier; must not be empty.
    pub user_id: String,
    /// Network identifier.
    pub network_id: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Role at the time of issuance.
    pub role: Option<UserRole>,
    /// Upstream access token.
    pub access_token: Option<String>,
}

impl SessionIdentity {
    /// Creates an identity with only a user identifier.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Sets the network identifier.
    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Sets the upstream access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("user_id", &self.user_id)
            .field("network_id", &self.network_id)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A freshly minted session.
#[derive(Clone)]
pub struct IssuedSession {
    /// Claims embedded in the token.
    pub claims: SessionClaims,
    /// Cookie carrying the signed token.
    pub cookie: Cookie<'static>,
}

impl fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSession")
            .field("claims", &self.claims)
            .field("cookie", &self.cookie.name())
            .finish()
    }
}

/// Issues a session for the identity, valid from now.
///
/// # Errors
///
/// Returns an authentication error if the user identifier is empty.
pub fn issue_session(keys: &SessionKeys, identity: SessionIdentity) -> Result<IssuedSession> {
    issue_session_at(keys, identity, Timestamp::now())
}

/// Issues a session as if it had been minted at `issued_at`.
///
/// # Errors
///
/// Returns an authentication error if the user identifier is empty.
pub fn issue_session_at(
    keys: &SessionKeys,
    identity: SessionIdentity,
    issued_at: Timestamp,
) -> Result<IssuedSession> {
    if identity.user_id.trim().is_empty() {
        return Err(Error::auth("session subject must not be empty"));
    }

    // Tokens carry whole seconds.
    let issued_at = Timestamp::from_second(issued_at.as_second()).map_err(|e| {
        Error::internal("session", "session issue time is out of range").with_source(e)
    })?;
    let expires_at = issued_at.checked_add(keys.ttl()).map_err(|e| {
        Error::internal("session", "session expiry is out of range").with_source(e)
    })?;

    let claims = SessionClaims {
        issued_by: SESSION_ISSUER.to_owned(),
        audience: SESSION_AUDIENCE.to_owned(),
        user_id: identity.user_id,
        issued_at,
        expires_at,
        network_id: identity.network_id,
        display_name: identity.display_name,
        role: identity.role,
        access_token: identity.access_token,
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, keys.encoding_key())
        .map_err(|e| Error::internal("session", "failed to sign session token").with_source(e))?;

    tracing::debug!(
        target: TRACING_TARGET_AUTHENTICATION,
        user_id = %claims.user_id,
        role = ?claims.role,
        expires_at = %claims.expires_at,
        "Session issued"
    );

    let cookie = session_cookie(keys, token);
    Ok(IssuedSession { claims, cookie })
}

/// Returns the cookie that removes the session.
///
/// Same name and path as the session cookie, empty value, `Max-Age=0`.
pub fn destroy_session() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

fn session_cookie(keys: &SessionKeys, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(keys.secure_cookies())
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(keys.ttl().as_secs()))
        .build()
}
