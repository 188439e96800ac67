//! Staff permission repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for back-office permission grants.
pub trait StaffPermissionRepository {
    /// Lists the permission keys granted to a user, sorted.
    ///
    /// Unknown users have no permissions.
    fn list_user_permissions(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = PgResult<Vec<String>>> + Send;
}

impl StaffPermissionRepository for PgConnection {
    async fn list_user_permissions(&mut self, user_id: &str) -> PgResult<Vec<String>> {
        use schema::staff_permissions::{self, dsl};

        staff_permissions::table
            .filter(dsl::user_id.eq(user_id))
            .select(dsl::permission)
            .order(dsl::permission.asc())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
