//! Extra routes an embedding application mounts next to the built-in ones.

use std::borrow::Cow;
use std::fmt;

use axum::Router;

use crate::service::ServiceState;

/// Transformation applied to a route group around its guard.
pub type RouterMapFn = fn(Router<ServiceState>) -> Router<ServiceState>;

/// Routes sharing one guard, with optional maps applied before and after it.
#[derive(Default, Clone)]
pub(crate) struct RouteGroup {
    routes: Option<Router<ServiceState>>,
    before: Option<RouterMapFn>,
    after: Option<RouterMapFn>,
}

impl RouteGroup {
    /// Adds routes to the group; a router without routes is ignored.
    pub(crate) fn add(&mut self, routes: Router<ServiceState>) {
        if !routes.has_routes() {
            return;
        }
        self.routes = Some(match self.routes.take() {
            Some(existing) => existing.merge(routes),
            None => routes,
        });
    }

    /// Applies `before`, the guard and `after`, in that order.
    ///
    /// Returns `None` without calling `guard` when the group is empty.
    /// `route_layer` panics on a router without routes.
    pub(crate) fn guard_with(
        self,
        guard: impl FnOnce(Router<ServiceState>) -> Router<ServiceState>,
    ) -> Option<Router<ServiceState>> {
        let routes = self.routes?;
        let routes = match self.before {
            Some(map) => map(routes),
            None => routes,
        };
        let routes = guard(routes);
        Some(match self.after {
            Some(map) => map(routes),
            None => routes,
        })
    }
}

/// Routes guarded by one staff permission key.
#[derive(Clone)]
pub(crate) struct StaffRoutes {
    pub permission: Cow<'static, str>,
    pub routes: Router<ServiceState>,
}

/// Application routes merged into [`routes`].
///
/// Public routes are served to anyone, private routes need a session and
/// staff routes additionally need a permission key.
///
/// ```rust,ignore
/// use axum::Router;
/// use axum::routing::get;
/// use portal_server::extract::StaffPermission;
/// use portal_server::handler::CustomRoutes;
///
/// let custom = CustomRoutes::new()
///     .add_public_routes(Router::new().route("/api/events", get(list_events)))
///     .add_staff_routes(
///         StaffPermission::Events.as_str(),
///         Router::new().route("/api/admin/events", get(manage_events)),
///     );
/// ```
///
/// [`routes`]: crate::handler::routes
#[derive(Default, Clone)]
pub struct CustomRoutes {
    pub(crate) public: RouteGroup,
    pub(crate) private: RouteGroup,
    pub(crate) staff: Vec<StaffRoutes>,
    pub(crate) disable_sign_in: bool,
}

impl CustomRoutes {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_public_routes(mut self, routes: Router<ServiceState>) -> Self {
        self.public.add(routes);
        self
    }

    pub fn add_private_routes(mut self, routes: Router<ServiceState>) -> Self {
        self.private.add(routes);
        self
    }

    /// Adds routes reachable only with the given staff permission.
    ///
    /// A router without routes is ignored.
    pub fn add_staff_routes(
        mut self,
        permission: impl Into<Cow<'static, str>>,
        routes: Router<ServiceState>,
    ) -> Self {
        if !routes.has_routes() {
            return self;
        }
        self.staff.push(StaffRoutes {
            permission: permission.into(),
            routes,
        });
        self
    }

    /// Drops `/api/auth/login`, `/api/auth/callback` and `/api/auth/logout`.
    ///
    /// Session inspection stays available.
    pub fn with_disable_sign_in(mut self, disable: bool) -> Self {
        self.disable_sign_in = disable;
        self
    }

    pub fn map_public_before_guard(mut self, map: RouterMapFn) -> Self {
        self.public.before = Some(map);
        self
    }

    pub fn map_public_after_guard(mut self, map: RouterMapFn) -> Self {
        self.public.after = Some(map);
        self
    }

    pub fn map_private_before_guard(mut self, map: RouterMapFn) -> Self {
        self.private.before = Some(map);
        self
    }

    pub fn map_private_after_guard(mut self, map: RouterMapFn) -> Self {
        self.private.after = Some(map);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.public.routes.is_none() && self.private.routes.is_none() && self.staff.is_empty()
    }

    /// Combines two sets; maps and the sign-in flag of `self` win.
    pub fn merge(mut self, other: CustomRoutes) -> Self {
        if let Some(routes) = other.public.routes {
            self.public.add(routes);
        }
        if let Some(routes) = other.private.routes {
            self.private.add(routes);
        }
        self.staff.extend(other.staff);
        self
    }
}

impl fmt::Debug for CustomRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let staff: Vec<&str> = self.staff.iter().map(|s| s.permission.as_ref()).collect();
        f.debug_struct("CustomRoutes")
            .field("public", &self.public.routes.is_some())
            .field("private", &self.private.routes.is_some())
            .field("staff", &staff)
            .field("disable_sign_in", &self.disable_sign_in)
            .finish()
    }
}
