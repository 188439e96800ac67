//! User repository.

use std::future::Future;

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::model::{NewUser, User};
use crate::types::UserRole;
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for user database operations.
pub trait UserRepository {
    /// Finds only the role of a user.
    ///
    /// Returns `None` if no such user exists. Issues a single query.
    fn find_user_role(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = PgResult<Option<UserRole>>> + Send;

    /// Creates a user keyed by network identifier, or refreshes the profile
    /// fields of the existing one.
    ///
    /// The identifier and role of an existing user are never changed.
    fn upsert_user(&mut self, new_user: NewUser) -> impl Future<Output = PgResult<User>> + Send;
}

impl UserRepository for PgConnection {
    async fn find_user_role(&mut self, user_id: &str) -> PgResult<Option<UserRole>> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::id.eq(user_id))
            .select(dsl::role)
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn upsert_user(&mut self, mut new_user: NewUser) -> PgResult<User> {
        use diesel::dsl::now;
        use schema::users::{self, dsl};

        new_user.network_id = new_user.network_id.trim().to_owned();
        new_user.display_name = new_user
            .display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        new_user.email_address = new_user
            .email_address
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .on_conflict(dsl::network_id)
            .do_update()
            .set((
                dsl::display_name.eq(excluded(dsl::display_name)),
                dsl::email_address.eq(excluded(dsl::email_address)),
                dsl::updated_at.eq(now),
            ))
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            user_id = %user.id,
            network_id = %user.network_id,
            "User upserted"
        );

        Ok(user)
    }
}
