//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use axum::Router;
//! use axum::routing::get;
//! use portal_server::extract::{Session, StaffPermission};
//! use portal_server::handler::{CustomRoutes, routes};
//! use portal_server::service::{ServiceConfig, ServiceState};
//!
//! async fn profile(session: Session) -> String {
//!     session.user_id
//! }
//!
//! async fn manage_events() -> &'static str {
//!     "events"
//! }
//!
//! let state = ServiceState::from_config(&config).await?;
//!
//! let custom_routes = CustomRoutes::new()
//!     .add_private_routes(Router::new().route("/api/profile", get(profile)))
//!     .add_staff_routes(
//!         StaffPermission::Events.as_str(),
//!         Router::new().route("/api/admin/events", get(manage_events)),
//!     );
//!
//! let router = routes(custom_routes, state.clone()).with_state(state);
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod authentication;
mod error;
mod monitors;
mod request;
mod response;
mod utils;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::request::{CallbackQuery, LoginQuery, LogoutQuery};
pub use crate::handler::response::{HealthResponse, PermissionsResponse, SessionResponse};
pub use crate::handler::utils::{CustomRoutes, RouterMapFn};
use crate::middleware::{RequiredPermission, require_session, require_staff_permission};
use crate::service::ServiceState;

async fn not_found() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Builds the full API router around the embedding application's routes.
///
/// Private routes get [`require_session`], each staff group gets its own
/// [`require_staff_permission`] check, and unknown paths answer with a JSON
/// 404.
pub fn routes(custom: CustomRoutes, state: ServiceState) -> Router<ServiceState> {
    let CustomRoutes {
        mut public,
        private,
        staff,
        disable_sign_in,
    } = custom;

    let mut builtin = Router::new()
        .merge(authentication::session_routes())
        .merge(monitors::routes());
    if !disable_sign_in {
        builtin = builtin.merge(authentication::sign_in_routes());
    }
    public.add(builtin);

    let private = private.guard_with(|routes| {
        routes.route_layer(from_fn_with_state(state.clone(), require_session))
    });

    let staff = staff.into_iter().fold(Router::new(), |router, group| {
        let required = RequiredPermission::new(state.clone(), group.permission);
        let guard = from_fn_with_state(required, require_staff_permission);
        router.merge(group.routes.route_layer(guard))
    });

    let public = public.guard_with(|routes| routes);

    Router::new()
        .merge(private.unwrap_or_default())
        .merge(staff)
        .merge(public.unwrap_or_default())
        .fallback(not_found)
}
