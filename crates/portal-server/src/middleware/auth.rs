//! Session and permission enforcement for route groups.

use std::borrow::Cow;

use axum::extract::{FromRef, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::extract::{Session, has_permission};
use crate::handler::ErrorKind;
use crate::service::{ServiceState, SessionKeys, SharedAccountStore};
use crate::utility::tracing_targets::TRACING_TARGET_AUTHORIZATION;

/// Rejects requests without a valid session.
///
/// The [`Session`] extractor does the work; a missing or invalid session
/// produces a 401 before `next` runs.
pub async fn require_session(session: Session, request: Request, next: Next) -> Response {
    tracing::trace!(
        target: TRACING_TARGET_AUTHORIZATION,
        user_id = %session.user_id,
        "Session present"
    );

    next.run(request).await
}

/// State of [`require_staff_permission`]: the services plus the key to check.
#[derive(Debug, Clone)]
pub struct RequiredPermission {
    state: ServiceState,
    permission: Cow<'static, str>,
}

impl RequiredPermission {
    /// Requires `permission` on top of a valid session.
    pub fn new(state: ServiceState, permission: impl Into<Cow<'static, str>>) -> Self {
        Self {
            state,
            permission: permission.into(),
        }
    }

    /// Returns the required permission key.
    #[inline]
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

impl FromRef<RequiredPermission> for SessionKeys {
    fn from_ref(input: &RequiredPermission) -> Self {
        input.state.session_keys.clone()
    }
}

impl FromRef<RequiredPermission> for SharedAccountStore {
    fn from_ref(input: &RequiredPermission) -> Self {
        input.state.account_store.clone()
    }
}

/// Rejects requests whose session lacks a staff permission.
///
/// 401 without a session, 403 when the permission gate denies.
pub async fn require_staff_permission(
    State(required): State<RequiredPermission>,
    session: Option<Session>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session) = session else {
        return ErrorKind::MissingAuthToken
            .with_message("Sign in to continue")
            .with_resource("session")
            .into_response();
    };

    let store = &required.state.account_store;
    if !has_permission(store.as_ref(), &session, required.permission()).await {
        tracing::warn!(
            target: TRACING_TARGET_AUTHORIZATION,
            user_id = %session.user_id,
            role = %session.role,
            permission = required.permission(),
            "Denied access to staff route"
        );

        return ErrorKind::Forbidden
            .with_message("Missing permission")
            .with_resource(required.permission.clone())
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_extra::extract::cookie::Cookie;
    use jiff::{SignedDuration, Timestamp};
    use portal_postgres::types::UserRole;

    use crate::extract::{
        Session, SessionIdentity, StaffPermission, issue_session, issue_session_at,
    };
    use crate::handler::CustomRoutes;
    use crate::handler::test::{TestApp, create_test_app_with_routes};
    use crate::service::IdentityConfig;

    async fn whoami(session: Session) -> String {
        session.user_id
    }

    async fn staff_app() -> anyhow::Result<TestApp> {
        let custom_routes = CustomRoutes::new()
            .add_private_routes(Router::new().route("/api/me", get(whoami)))
            .add_staff_routes(
                StaffPermission::Events.as_str(),
                Router::new().route("/api/admin/events", get(whoami)),
            )
            .add_staff_routes(
                StaffPermission::Users.as_str(),
                Router::new().route("/api/admin/users", get(whoami)),
            );

        create_test_app_with_routes(custom_routes, &IdentityConfig::default()).await
    }

    fn cookie_for(app: &TestApp, identity: SessionIdentity) -> Cookie<'static> {
        issue_session(&app.state.session_keys, identity).unwrap().cookie
    }

    #[tokio::test]
    async fn private_routes_require_session() -> anyhow::Result<()> {
        let app = staff_app().await?;
        app.server.get("/api/me").await.assert_status_unauthorized();

        let response = app
            .server
            .get("/api/me")
            .add_cookie(cookie_for(&app, SessionIdentity::new("u1")))
            .await;
        response.assert_status_ok();
        response.assert_text("u1");
        Ok(())
    }

    #[tokio::test]
    async fn staff_routes_check_permission() -> anyhow::Result<()> {
        let app = staff_app().await?;
        app.store.insert_user("s1", UserRole::Staff).await;
        app.store.grant("s1", StaffPermission::Events.as_str()).await;
        let cookie = cookie_for(&app, SessionIdentity::new("s1").with_role(UserRole::Staff));

        app.server.get("/api/admin/events").await.assert_status_unauthorized();
        app.server
            .get("/api/admin/events")
            .add_cookie(cookie.clone())
            .await
            .assert_status_ok();
        app.server
            .get("/api/admin/users")
            .add_cookie(cookie)
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[tokio::test]
    async fn users_are_forbidden_and_admins_pass() -> anyhow::Result<()> {
        let app = staff_app().await?;
        app.store.grant("u1", StaffPermission::Events.as_str()).await;

        let user = cookie_for(&app, SessionIdentity::new("u1").with_role(UserRole::User));
        app.server
            .get("/api/admin/events")
            .add_cookie(user)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let admin = cookie_for(&app, SessionIdentity::new("a1").with_role(UserRole::Admin));
        app.server
            .get("/api/admin/users")
            .add_cookie(admin)
            .await
            .assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn revoked_grant_takes_effect_immediately() -> anyhow::Result<()> {
        let app = staff_app().await?;
        let cookie = cookie_for(&app, SessionIdentity::new("s1").with_role(UserRole::Staff));

        app.server
            .get("/api/admin/events")
            .add_cookie(cookie.clone())
            .await
            .assert_status_forbidden();

        app.store.grant("s1", StaffPermission::Events.as_str()).await;
        app.server
            .get("/api/admin/events")
            .add_cookie(cookie)
            .await
            .assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn store_outage_denies_staff() -> anyhow::Result<()> {
        let app = staff_app().await?;
        app.store.grant("s1", StaffPermission::Events.as_str()).await;
        app.store.set_unavailable(true);

        let cookie = cookie_for(&app, SessionIdentity::new("s1").with_role(UserRole::Staff));
        app.server
            .get("/api/admin/events")
            .add_cookie(cookie)
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[tokio::test]
    async fn expired_admin_is_unauthorized() -> anyhow::Result<()> {
        let app = staff_app().await?;
        let issued_at = Timestamp::now() - SignedDuration::from_hours(7);
        let identity = SessionIdentity::new("a1").with_role(UserRole::Admin);
        let issued = issue_session_at(&app.state.session_keys, identity, issued_at)?;

        app.server
            .get("/api/admin/users")
            .add_cookie(issued.cookie)
            .await
            .assert_status_unauthorized();
        Ok(())
    }
}
