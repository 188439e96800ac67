//! Domain types shared between the database layer and its callers.

mod user_role;

pub use user_role::UserRole;
