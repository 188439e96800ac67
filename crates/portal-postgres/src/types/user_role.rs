//! Portal-wide role enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Portal-wide role of a user.
///
/// Corresponds to the `USER_ROLE` PostgreSQL enum. Serialized in upper case,
/// the same spelling the session token carries.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::UserRole"]
pub enum UserRole {
    /// Regular member; never holds staff permissions.
    #[db_rename = "USER"]
    #[serde(rename = "USER")]
    #[strum(serialize = "USER")]
    #[default]
    User,

    /// Staff member constrained to individually granted permissions.
    #[db_rename = "STAFF"]
    #[serde(rename = "STAFF")]
    #[strum(serialize = "STAFF")]
    Staff,

    /// Administrator; implicitly holds every permission.
    #[db_rename = "ADMIN"]
    #[serde(rename = "ADMIN")]
    #[strum(serialize = "ADMIN")]
    Admin,
}

impl UserRole {
    /// Returns whether this role bypasses permission checks.
    #[inline]
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Returns whether this role may hold staff permissions.
    #[inline]
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::Staff | UserRole::Admin)
    }
}
