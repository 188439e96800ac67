//! Repository traits implemented on [`PgConnection`].
//!
//! [`PgConnection`]: crate::PgConnection

mod staff_permission;
mod user;

pub use staff_permission::StaffPermissionRepository;
pub use user::UserRepository;
