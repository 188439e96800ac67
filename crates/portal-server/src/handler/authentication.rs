//! Sign-in, sign-out and session introspection handlers.
//!
//! The browser is sent to the network's identity provider with the sanitized
//! destination as OAuth `state`. The callback exchanges the code, upserts the
//! account and sets the session cookie before landing on that destination.
//! Failures in the callback never produce an error page: they redirect home
//! with an `error` code the front end can display.

use axum::extract::{Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;

use super::request::{CallbackQuery, LoginQuery, LogoutQuery};
use super::response::{PermissionsResponse, SessionResponse};
use super::utils::{found, login_error};
use crate::extract::{
    Session, SessionIdentity, destroy_session, effective_permissions, issue_session,
};
use crate::handler::Result;
use crate::service::{IdentityProvider, RedirectPolicy, ServiceState, SharedAccountStore};
use crate::utility::tracing_targets::TRACING_TARGET_AUTHENTICATION as TRACING_TARGET;

const NO_STORE: [(axum::http::HeaderName, &str); 1] = [(CACHE_CONTROL, "no-store")];

/// Starts the sign-in flow.
#[tracing::instrument(skip_all)]
async fn login(
    State(identity_provider): State<IdentityProvider>,
    State(redirect_policy): State<RedirectPolicy>,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    let destination = redirect_policy.sanitize(query.callback_url.as_deref());
    let authorize_url =
        identity_provider.authorize_url(&redirect_policy.callback_url(), &destination)?;

    tracing::debug!(
        target: TRACING_TARGET,
        destination = %destination,
        "Redirecting to identity provider"
    );

    Ok(found(authorize_url.as_str()))
}

/// Completes the sign-in flow.
#[tracing::instrument(skip_all)]
async fn callback(
    State(state): State<ServiceState>,
    cookies: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error.as_deref().filter(|e| !e.is_empty()) {
        tracing::warn!(
            target: TRACING_TARGET,
            error = error,
            description = query.error_description.as_deref(),
            "Identity provider returned an error"
        );
        return login_error(error);
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::warn!(target: TRACING_TARGET, "Callback without authorization code");
        return login_error("missing_code");
    };

    let redirect_policy = &state.redirect_policy;
    let destination = redirect_policy.sanitize(query.state.as_deref());

    let exchanged = match state
        .identity_provider
        .exchange(code, &redirect_policy.callback_url())
        .await
    {
        Ok(exchanged) => exchanged,
        Err(error) => {
            tracing::warn!(target: TRACING_TARGET, error = %error, "Code exchange failed");
            return login_error("exchange_failed");
        }
    };

    let account = match state.account_store.upsert_account(&exchanged.claims).await {
        Ok(account) => account,
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET,
                network_id = %exchanged.claims.subject,
                error = %error,
                "Failed to upsert account"
            );
            return login_error("account_unavailable");
        }
    };

    let mut identity = SessionIdentity::new(account.id.clone())
        .with_network_id(account.network_id.clone())
        .with_role(account.role)
        .with_access_token(exchanged.access_token);
    if let Some(display_name) = account.display_name {
        identity = identity.with_display_name(display_name);
    }

    let issued = match issue_session(&state.session_keys, identity) {
        Ok(issued) => issued,
        Err(error) => {
            tracing::error!(target: TRACING_TARGET, error = %error, "Failed to issue session");
            return login_error("session_failed");
        }
    };

    tracing::info!(
        target: TRACING_TARGET,
        user_id = %account.id,
        role = %account.role,
        "Signed in"
    );

    (cookies.add(issued.cookie), found(&destination)).into_response()
}

/// Removes the session cookie.
///
/// Idempotent: signing out without a session behaves the same.
#[tracing::instrument(skip_all)]
async fn logout(
    State(redirect_policy): State<RedirectPolicy>,
    cookies: CookieJar,
    Query(query): Query<LogoutQuery>,
) -> Response {
    let destination = redirect_policy.sanitize(query.callback_url.as_deref());
    tracing::debug!(target: TRACING_TARGET, destination = %destination, "Signed out");

    (cookies.add(destroy_session()), found(&destination)).into_response()
}

/// Returns the current session, or `null`.
async fn session(session: Option<Session>) -> impl IntoResponse {
    (NO_STORE, Json(session.as_ref().map(SessionResponse::from)))
}

/// Returns what the current session may do.
async fn permissions(
    State(account_store): State<SharedAccountStore>,
    session: Session,
) -> Result<impl IntoResponse> {
    let effective = effective_permissions(account_store.as_ref(), &session).await?;
    let response = PermissionsResponse::new(session.role, effective);
    Ok((NO_STORE, Json(response)))
}

/// Returns a [`Router`] with the sign-in routes.
pub fn sign_in_routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/auth/login", get(login))
        .route("/api/auth/callback", get(callback))
        .route("/api/auth/logout", get(logout).post(logout))
}

/// Returns a [`Router`] with the session introspection routes.
pub fn session_routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/auth/session", get(session))
        .route("/api/auth/permissions", get(permissions))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::http::StatusCode;
    use axum::http::header::{LOCATION, SET_COOKIE};
    use axum_extra::extract::cookie::Cookie;
    use jiff::{SignedDuration, Timestamp};
    use portal_postgres::types::UserRole;
    use url::Url;

    use super::*;
    use crate::extract::{SESSION_COOKIE, SessionClaims, issue_session_at};
    use crate::handler::test::{TestApp, create_test_app, create_test_app_with_identity};
    use crate::service::IdentityConfig;
    use crate::service::identity::{TEST_CODE, spawn_fake_provider};

    fn location(response: &axum_test::TestResponse) -> String {
        response.header(LOCATION).to_str().unwrap().to_owned()
    }

    fn session_cookie(app: &TestApp, identity: SessionIdentity) -> Cookie<'static> {
        issue_session(&app.state.session_keys, identity).unwrap().cookie
    }

    #[tokio::test]
    async fn login_redirects_to_provider() -> anyhow::Result<()> {
        let identity = IdentityConfig {
            sso_client_id: Some("portal".to_owned()),
            ..IdentityConfig::default()
        };
        let app = create_test_app_with_identity(&identity).await?;

        let response = app
            .server
            .get("/api/auth/login")
            .add_query_param("callbackUrl", "/events?id=4")
            .await;
        response.assert_status(StatusCode::FOUND);

        let url = Url::parse(&location(&response))?;
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("auth.vatsim.net"));
        assert_eq!(pairs["client_id"], "portal");
        assert_eq!(pairs["state"], "/events?id=4");
        assert_eq!(pairs["redirect_uri"], "http://localhost:3000/api/auth/callback");
        Ok(())
    }

    #[tokio::test]
    async fn login_sanitizes_foreign_destination() -> anyhow::Result<()> {
        let identity = IdentityConfig {
            sso_client_id: Some("portal".to_owned()),
            ..IdentityConfig::default()
        };
        let app = create_test_app_with_identity(&identity).await?;

        let response = app
            .server
            .get("/api/auth/login")
            .add_query_param("callbackUrl", "https://evil.example/steal")
            .await;

        let url = Url::parse(&location(&response))?;
        let state = url.query_pairs().find(|(k, _)| k == "state").map(|(_, v)| v.into_owned());
        assert_eq!(state.as_deref(), Some("/"));
        Ok(())
    }

    #[tokio::test]
    async fn login_without_client_id_fails() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let response = app.server.get("/api/auth/login").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn callback_signs_in_and_redirects() -> anyhow::Result<()> {
        let identity = spawn_fake_provider().await?;
        let app = create_test_app_with_identity(&identity).await?;

        let response = app
            .server
            .get("/api/auth/callback")
            .add_query_param("code", TEST_CODE)
            .add_query_param("state", "https://evil.example/x")
            .await;

        response.assert_status(StatusCode::FOUND);
        assert_eq!(location(&response), "/");

        let cookie = response.cookie(SESSION_COOKIE);
        assert!(!cookie.value().is_empty());
        assert_eq!(cookie.http_only(), Some(true));

        let session = app
            .server
            .get("/api/auth/session")
            .add_cookie(cookie)
            .await
            .json::<Option<SessionResponse>>()
            .expect("session after sign-in");
        assert_eq!(session.cid.as_deref(), Some("1234567"));
        assert_eq!(session.name.as_deref(), Some("Ana Silva"));
        assert_eq!(session.role, UserRole::User);
        Ok(())
    }

    #[tokio::test]
    async fn callback_keeps_existing_role() -> anyhow::Result<()> {
        let identity = spawn_fake_provider().await?;
        let app = create_test_app_with_identity(&identity).await?;
        app.store.insert_user("1234567", UserRole::Staff).await;

        let response = app
            .server
            .get("/api/auth/callback")
            .add_query_param("code", TEST_CODE)
            .add_query_param("state", "/events")
            .await;
        assert_eq!(location(&response), "/events");

        let cookie = response.cookie(SESSION_COOKIE);
        let claims = SessionClaims::decode(&app.state.session_keys, cookie.value())?;
        assert_eq!(claims.user_id, "1234567");
        assert_eq!(claims.role, Some(UserRole::Staff));
        Ok(())
    }

    #[tokio::test]
    async fn callback_reports_provider_error() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let response = app
            .server
            .get("/api/auth/callback")
            .add_query_param("error", "access_denied")
            .add_query_param("error_description", "The user denied access")
            .await;

        response.assert_status(StatusCode::FOUND);
        assert_eq!(location(&response), "/?error=access_denied");
        assert!(response.maybe_cookie(SESSION_COOKIE).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn callback_without_code() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let response = app.server.get("/api/auth/callback").await;
        assert_eq!(location(&response), "/?error=missing_code");
        Ok(())
    }

    #[tokio::test]
    async fn callback_with_rejected_code() -> anyhow::Result<()> {
        let identity = spawn_fake_provider().await?;
        let app = create_test_app_with_identity(&identity).await?;

        let response = app
            .server
            .get("/api/auth/callback")
            .add_query_param("code", "stale-code")
            .await;
        assert_eq!(location(&response), "/?error=exchange_failed");
        assert!(response.maybe_cookie(SESSION_COOKIE).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn callback_with_store_down() -> anyhow::Result<()> {
        let identity = spawn_fake_provider().await?;
        let app = create_test_app_with_identity(&identity).await?;
        app.store.set_unavailable(true);

        let response = app
            .server
            .get("/api/auth/callback")
            .add_query_param("code", TEST_CODE)
            .await;
        assert_eq!(location(&response), "/?error=account_unavailable");
        Ok(())
    }

    #[tokio::test]
    async fn logout_is_idempotent() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let cookie = session_cookie(&app, SessionIdentity::new("u1"));

        for _ in 0..2 {
            let response = app
                .server
                .post("/api/auth/logout")
                .add_query_param("callbackUrl", "/pt/home")
                .add_cookie(cookie.clone())
                .await;

            response.assert_status(StatusCode::FOUND);
            assert_eq!(location(&response), "/pt/home");

            let set_cookie = response.header(SET_COOKIE).to_str()?.to_owned();
            assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}=;")));
            assert!(set_cookie.contains("Max-Age=0"));
        }

        let response = app.server.get("/api/auth/logout").await;
        assert_eq!(location(&response), "/");
        Ok(())
    }

    #[tokio::test]
    async fn session_is_null_without_cookie() -> anyhow::Result<()> {
        let app = create_test_app().await?;

        let response = app.server.get("/api/auth/session").await;
        response.assert_status_ok();
        assert_eq!(response.header(CACHE_CONTROL), "no-store");
        assert_eq!(response.json::<Option<SessionResponse>>(), None);
        Ok(())
    }

    #[tokio::test]
    async fn session_never_exposes_access_token() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let identity = SessionIdentity::new("u1")
            .with_network_id("1234567")
            .with_role(UserRole::Admin)
            .with_access_token("upstream-secret");

        let response = app
            .server
            .get("/api/auth/session")
            .add_cookie(session_cookie(&app, identity))
            .await;

        assert!(!response.text().contains("upstream-secret"));
        let session = response.json::<Option<SessionResponse>>().expect("session");
        assert_eq!(session.id, "u1");
        assert_eq!(session.role, UserRole::Admin);
        Ok(())
    }

    #[tokio::test]
    async fn permissions_require_session() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let response = app.server.get("/api/auth/permissions").await;
        response.assert_status_unauthorized();
        Ok(())
    }

    #[tokio::test]
    async fn permissions_of_staff() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        app.store.insert_user("u1", UserRole::Staff).await;
        app.store.grant("u1", "admin:events").await;
        app.store.grant("u1", "admin:exams").await;

        // Token minted before roles were embedded.
        let response = app
            .server
            .get("/api/auth/permissions")
            .add_cookie(session_cookie(&app, SessionIdentity::new("u1")))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header(CACHE_CONTROL), "no-store");
        let permissions = response.json::<PermissionsResponse>();
        assert_eq!(permissions.role, UserRole::Staff);
        assert!(!permissions.all);
        assert_eq!(permissions.permissions, ["admin:events", "admin:exams"]);
        assert_eq!(app.store.role_lookups(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn permissions_of_admin() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let identity = SessionIdentity::new("a1").with_role(UserRole::Admin);

        let permissions = app
            .server
            .get("/api/auth/permissions")
            .add_cookie(session_cookie(&app, identity))
            .await
            .json::<PermissionsResponse>();

        assert!(permissions.all);
        assert!(permissions.permissions.is_empty());
        assert_eq!(app.store.role_lookups(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_is_anonymous() -> anyhow::Result<()> {
        let app = create_test_app().await?;
        let issued_at = Timestamp::now() - SignedDuration::from_hours(7);
        let identity = SessionIdentity::new("a1").with_role(UserRole::Admin);
        let issued = issue_session_at(&app.state.session_keys, identity, issued_at)?;

        let response = app
            .server
            .get("/api/auth/session")
            .add_cookie(issued.cookie.clone())
            .await;
        assert_eq!(response.json::<Option<SessionResponse>>(), None);

        let response = app
            .server
            .get("/api/auth/permissions")
            .add_cookie(issued.cookie)
            .await;
        response.assert_status_unauthorized();
        Ok(())
    }
}
