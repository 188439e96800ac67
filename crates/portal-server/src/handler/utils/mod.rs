//! [`CustomRoutes`] and redirect helpers.

mod custom_routes;
mod redirect;

pub use crate::handler::utils::custom_routes::{CustomRoutes, RouterMapFn};
pub(crate) use crate::handler::utils::redirect::{found, login_error};
