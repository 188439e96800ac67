//! Connection lifecycle hooks that only log.

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::pg_config::mask_password;
use crate::{TRACING_TARGET_CONNECTION, TRACING_TARGET_MIGRATION};

/// Opens a new connection, logging how long it took.
pub(super) fn establish<C>(url: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    async move {
        let started = Instant::now();
        let result = C::establish(url).await;
        let elapsed_ms = started.elapsed().as_millis();

        if let Err(error) = &result {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                url = %mask_password(url),
                elapsed_ms,
                %error,
                "Cannot open database connection"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                elapsed_ms,
                "Database connection opened"
            );
        }

        result
    }
    .boxed()
}

pub(super) fn after_create(conn: &mut AsyncPgConnection, _: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(target: TRACING_TARGET_CONNECTION, "New database connection is already broken");
    }
    Ok(())
}

pub(super) fn after_recycle(
    conn: &mut AsyncPgConnection,
    metrics: &Metrics,
) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_CONNECTION,
            recycled = metrics.recycle_count,
            "Recycled database connection is broken"
        );
    }
    Ok(())
}

pub(super) fn before_migrate(conn: &mut AsyncPgConnection) {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            "Migration connection is broken, migrations will likely fail"
        );
    }
}
