//! User model for accounts signed in through the network's identity provider.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::users;
use crate::types::UserRole;

/// A user of the portal.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    /// Portal-local user identifier, the session subject.
    pub id: String,
    /// Identifier on the flight-simulation network (CID).
    pub network_id: String,
    /// Full name as reported by the identity provider.
    pub display_name: Option<String>,
    /// Email address as reported by the identity provider.
    pub email_address: Option<String>,
    /// Portal-wide role.
    pub role: UserRole,
    /// Timestamp when the user first signed in.
    pub created_at: Timestamp,
    /// Timestamp of the last profile refresh.
    pub updated_at: Timestamp,
}

/// Data for creating a user, or refreshing the profile of an existing one.
///
/// `role` is absent on purpose: new users get the column default and
/// existing users keep theirs.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    /// Identifier used only when the row is created.
    pub id: String,
    /// Identifier on the flight-simulation network (CID).
    pub network_id: String,
    /// Full name as reported by the identity provider.
    pub display_name: Option<String>,
    /// Email address as reported by the identity provider.
    pub email_address: Option<String>,
}
