//! Resolved session and its extractors.
//!
//! ```rust,ignore
//! use portal_server::extract::Session;
//!
//! // Requires a session, rejects with 401 otherwise.
//! async fn profile(session: Session) -> String {
//!     session.user_id
//! }
//!
//! // Never rejects.
//! async fn banner(session: Option<Session>) -> &'static str {
//!     if session.is_some() { "Welcome back" } else { "Sign in" }
//! }
//! ```

use std::fmt;

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use portal_postgres::types::UserRole;

use super::session_claims::{SESSION_COOKIE, SessionClaims};
use crate::handler::{Error, ErrorKind};
use crate::service::{AccountStore, SessionKeys, SharedAccountStore};
use crate::utility::tracing_targets::TRACING_TARGET_AUTHENTICATION;

/// A verified session with its role resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Portal user identifier.
    pub user_id: String,
    /// Network identifier.
    pub network_id: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Role, from the token or from the store.
    pub role: UserRole,
    /// Upstream access token.
    pub access_token: Option<String>,
}

impl Session {
    /// Builds a session from verified claims.
    ///
    /// Trusts the embedded role. Tokens without one cost exactly one store
    /// lookup; unknown users become [`UserRole::User`]. Returns `None` if the
    /// store fails.
    pub async fn from_claims(claims: SessionClaims, store: &dyn AccountStore) -> Option<Self> {
        let role = match claims.role {
            Some(role) => role,
            None => match store.find_role(&claims.user_id).await {
                Ok(role) => role.unwrap_or_default(),
                Err(error) => {
                    tracing::error!(
                        target: TRACING_TARGET_AUTHENTICATION,
                        user_id = %claims.user_id,
                        error = %error,
                        "Role lookup failed, treating request as anonymous"
                    );
                    return None;
                }
            },
        };

        Some(Self {
            user_id: claims.user_id,
            network_id: claims.network_id,
            display_name: claims.display_name,
            role,
            access_token: claims.access_token,
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("network_id", &self.network_id)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Resolves the session carried by the request cookies.
///
/// Absent, malformed, forged and expired tokens all yield `None`; the reason
/// is only logged at debug level.
pub async fn resolve_session(
    keys: &SessionKeys,
    store: &dyn AccountStore,
    cookies: &CookieJar,
) -> Option<Session> {
    let Some(cookie) = cookies.get(SESSION_COOKIE) else {
        tracing::trace!(target: TRACING_TARGET_AUTHENTICATION, "No session cookie");
        return None;
    };

    if cookie.value().is_empty() {
        tracing::debug!(target: TRACING_TARGET_AUTHENTICATION, "Empty session cookie");
        return None;
    }

    let claims = match SessionClaims::decode(keys, cookie.value()) {
        Ok(claims) => claims,
        Err(error) => {
            tracing::debug!(
                target: TRACING_TARGET_AUTHENTICATION,
                reason = %error,
                "Session token rejected"
            );
            return None;
        }
    };

    Session::from_claims(claims, store).await
}

/// Outcome of resolving the session once per request.
#[derive(Clone)]
struct ResolvedSession(Option<Session>);

impl Session {
    async fn resolve_cached<S>(parts: &mut Parts, state: &S) -> Option<Self>
    where
        S: Sync + Send,
        SessionKeys: FromRef<S>,
        SharedAccountStore: FromRef<S>,
    {
        // Cached so that later extractors and middleware never repeat the
        // role lookup within the same request.
        if let Some(ResolvedSession(session)) = parts.extensions.get::<ResolvedSession>() {
            return session.clone();
        }

        let keys = SessionKeys::from_ref(state);
        let store = SharedAccountStore::from_ref(state);
        let cookies = CookieJar::from_headers(&parts.headers);

        let session = resolve_session(&keys, store.as_ref(), &cookies).await;
        parts.extensions.insert(ResolvedSession(session.clone()));
        session
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Sync + Send,
    SessionKeys: FromRef<S>,
    SharedAccountStore: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Self::resolve_cached(parts, state).await.ok_or_else(|| {
            ErrorKind::MissingAuthToken
                .with_message("Sign in to continue")
                .with_resource("session")
        })
    }
}

impl<S> OptionalFromRequestParts<S> for Session
where
    S: Sync + Send,
    SessionKeys: FromRef<S>,
    SharedAccountStore: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::resolve_cached(parts, state).await)
    }
}
