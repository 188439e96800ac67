//! Staff permission gate.
//!
//! Administrators pass every check. Staff pass only checks for keys granted to
//! them, read fresh from the store on each call. Regular users never pass,
//! even if a stray grant exists for them.

use std::collections::BTreeSet;

use axum_extra::extract::CookieJar;
use portal_postgres::types::UserRole;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::session::{Session, resolve_session};
use crate::Result;
use crate::service::{AccountStore, SessionKeys};
use crate::utility::tracing_targets::TRACING_TARGET_AUTHORIZATION;

/// Permission keys used by the back office.
///
/// The gate accepts any key; this enum only names the known ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum StaffPermission {
    /// Manage airport pages.
    #[strum(serialize = "admin:airports")]
    Airports,
    /// Manage events.
    #[strum(serialize = "admin:events")]
    Events,
    /// Manage exams.
    #[strum(serialize = "admin:exams")]
    Exams,
    /// Manage training.
    #[strum(serialize = "admin:training")]
    Training,
    /// Read and answer feedback.
    #[strum(serialize = "admin:feedback")]
    Feedback,
    /// Moderate testimonials.
    #[strum(serialize = "admin:testimonials")]
    Testimonials,
    /// Edit translations.
    #[strum(serialize = "admin:translations")]
    Translations,
    /// Manage users and their grants.
    #[strum(serialize = "admin:users")]
    Users,
    /// Read audit logs.
    #[strum(serialize = "admin:audit-logs")]
    AuditLogs,
}

impl StaffPermission {
    /// Returns the permission key.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Permissions a session effectively holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectivePermissions {
    /// Every permission, implied by the role.
    All,
    /// Only the listed permission keys.
    Granted(BTreeSet<String>),
}

impl EffectivePermissions {
    /// Returns whether the key is covered.
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Granted(granted) => granted.contains(key),
        }
    }
}

/// Decides whether an already resolved session holds a permission.
///
/// Store failures deny.
pub async fn has_permission(
    store: &dyn AccountStore,
    session: &Session,
    key: impl AsRef<str>,
) -> bool {
    let key = key.as_ref();

    let allowed = match session.role {
        UserRole::Admin => true,
        UserRole::User => false,
        UserRole::Staff => match store.find_permissions(&session.user_id).await {
            Ok(granted) => granted.iter().any(|permission| permission == key),
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_AUTHORIZATION,
                    user_id = %session.user_id,
                    permission = key,
                    error = %error,
                    "Permission lookup failed, denying"
                );
                false
            }
        },
    };

    tracing::debug!(
        target: TRACING_TARGET_AUTHORIZATION,
        user_id = %session.user_id,
        role = %session.role,
        permission = key,
        allowed,
        "Permission checked"
    );

    allowed
}

/// Resolves the session from the cookies and checks a permission.
///
/// No session denies.
pub async fn require_permission(
    keys: &SessionKeys,
    store: &dyn AccountStore,
    cookies: &CookieJar,
    key: impl AsRef<str>,
) -> bool {
    match resolve_session(keys, store, cookies).await {
        Some(session) => has_permission(store, &session, key).await,
        None => false,
    }
}

/// Lists what a session may do.
///
/// # Errors
///
/// Returns the store error if the granted set of a staff member cannot be
/// read.
pub async fn effective_permissions(
    store: &dyn AccountStore,
    session: &Session,
) -> Result<EffectivePermissions> {
    match session.role {
        UserRole::Admin => Ok(EffectivePermissions::All),
        UserRole::User => Ok(EffectivePermissions::Granted(BTreeSet::new())),
        UserRole::Staff => {
            let granted = store.find_permissions(&session.user_id).await?;
            Ok(EffectivePermissions::Granted(granted.into_iter().collect()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use axum::http::header::COOKIE;
    use jiff::{SignedDuration, Timestamp};
    use strum::IntoEnumIterator;

    use super::*;
    use crate::extract::auth::session_claims::{
        SESSION_COOKIE, SessionIdentity, issue_session, issue_session_at,
    };
    use crate::service::InMemoryAccountStore;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn keys() -> SessionKeys {
        SessionKeys::new(SECRET, 21_600, false).unwrap()
    }

    fn session(user_id: &str, role: UserRole) -> Session {
        Session {
            user_id: user_id.to_owned(),
            network_id: None,
            display_name: None,
            role,
            access_token: None,
        }
    }

    fn jar_with(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("{SESSION_COOKIE}={value}").parse().unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn permission_keys() {
        assert_eq!(StaffPermission::Events.as_str(), "admin:events");
        assert_eq!(StaffPermission::AuditLogs.to_string(), "admin:audit-logs");
        assert_eq!(
            "admin:translations".parse::<StaffPermission>().ok(),
            Some(StaffPermission::Translations)
        );
        assert_eq!(StaffPermission::iter().count(), 9);
    }

    #[tokio::test]
    async fn admin_holds_everything() {
        let store = InMemoryAccountStore::new();
        let admin = session("a1", UserRole::Admin);

        for permission in StaffPermission::iter() {
            assert!(has_permission(&store, &admin, permission).await);
        }
        assert!(has_permission(&store, &admin, "admin:anything-else").await);
    }

    #[tokio::test]
    async fn staff_holds_only_granted() {
        let store = InMemoryAccountStore::new();
        store.grant("s1", StaffPermission::Events.as_str()).await;
        let staff = session("s1", UserRole::Staff);

        assert!(has_permission(&store, &staff, StaffPermission::Events).await);
        assert!(!has_permission(&store, &staff, StaffPermission::Feedback).await);
    }

    #[tokio::test]
    async fn user_holds_nothing_even_with_stray_grant() {
        let store = InMemoryAccountStore::new();
        store.grant("u1", "admin:events").await;
        let user = session("u1", UserRole::User);

        assert!(!has_permission(&store, &user, "admin:events").await);
        assert!(!has_permission(&store, &user, "admin:users").await);
    }

    #[tokio::test]
    async fn store_failure_denies() {
        let store = InMemoryAccountStore::new();
        store.grant("s1", "admin:events").await;
        store.set_unavailable(true);

        assert!(!has_permission(&store, &session("s1", UserRole::Staff), "admin:events").await);
    }

    #[tokio::test]
    async fn gate_resolves_cookies() -> anyhow::Result<()> {
        let keys = keys();
        let store = InMemoryAccountStore::new();
        store.grant("s1", "admin:events").await;

        let issued = issue_session(&keys, SessionIdentity::new("s1").with_role(UserRole::Staff))?;
        let cookies = jar_with(issued.cookie.value());

        assert!(require_permission(&keys, &store, &cookies, "admin:events").await);
        assert!(!require_permission(&keys, &store, &cookies, "admin:feedback").await);
        assert!(!require_permission(&keys, &store, &CookieJar::new(), "admin:events").await);
        Ok(())
    }

    #[tokio::test]
    async fn expired_admin_is_denied() -> anyhow::Result<()> {
        let keys = keys();
        let store = InMemoryAccountStore::new();
        let issued_at = Timestamp::now() - SignedDuration::from_hours(7);
        let identity = SessionIdentity::new("a1").with_role(UserRole::Admin);
        let issued = issue_session_at(&keys, identity, issued_at)?;

        let cookies = jar_with(issued.cookie.value());
        assert!(!require_permission(&keys, &store, &cookies, "admin:users").await);
        Ok(())
    }

    #[tokio::test]
    async fn effective_permissions_per_role() -> anyhow::Result<()> {
        let store = InMemoryAccountStore::new();
        store.grant("s1", "admin:events").await;
        store.grant("s1", "admin:exams").await;
        store.grant("u1", "admin:events").await;

        let admin = effective_permissions(&store, &session("a1", UserRole::Admin)).await?;
        assert_eq!(admin, EffectivePermissions::All);
        assert!(admin.contains("admin:users"));

        let staff = effective_permissions(&store, &session("s1", UserRole::Staff)).await?;
        assert!(staff.contains("admin:exams"));
        assert!(!staff.contains("admin:users"));

        let user = effective_permissions(&store, &session("u1", UserRole::User)).await?;
        assert_eq!(user, EffectivePermissions::Granted(BTreeSet::new()));
        Ok(())
    }
}
