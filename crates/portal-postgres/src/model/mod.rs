//! Diesel models for the portal's tables.

mod user;

pub use user::{NewUser, User};
