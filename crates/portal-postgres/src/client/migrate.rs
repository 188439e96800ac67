//! Embedded schema migrations.

use std::time::{Duration, Instant};

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use super::custom_hooks;
use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Total duration of the migration run
    pub duration: Duration,
    /// Versions applied during this run, oldest first
    pub processed_versions: Vec<String>,
}

impl MigrationResult {
    /// Returns whether nothing had to be applied.
    #[inline]
    pub fn is_no_op(&self) -> bool {
        self.processed_versions.is_empty()
    }
}

/// Extension trait adding migration support to [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every embedded migration that has not yet been applied.
    ///
    /// Safe to call on every startup.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send;
}

impl PgClientMigrationExt for PgClient {
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    async fn run_pending_migrations(&self) -> PgResult<MigrationResult> {
        let start_time = Instant::now();
        let mut conn = self.get_pooled_connection().await?;
        custom_hooks::before_migrate(&mut conn);

        let mut conn: AsyncConnectionWrapper<_> = conn.into();
        let versions = spawn_blocking(move || {
            conn.run_pending_migrations(MIGRATIONS).map(|versions| {
                versions
                    .into_iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
            })
        })
        .await
        .map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_MIGRATION,
                error = %err,
                "Migration task panicked"
            );
            PgError::Migration(err.into())
        })?
        .map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_MIGRATION,
                error = %err,
                "Database migration failed"
            );
            PgError::Migration(err)
        })?;

        let duration = start_time.elapsed();
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?duration,
            migrations_count = versions.len(),
            "Database migrations applied"
        );

        Ok(MigrationResult {
            duration,
            processed_versions: versions,
        })
    }
}
