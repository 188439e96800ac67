use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::managed::{Hook, Pool};
use derive_more::{Deref, DerefMut};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::custom_hooks;
use crate::{
    ConnectionPool, PgConfig, PgError, PgResult, PooledConnection, TRACING_TARGET_CONNECTION,
};

/// Acquisitions slower than this are logged as a warning.
const SLOW_ACQUIRE: Duration = Duration::from_millis(100);

/// Handle to the account database.
///
/// Clones share one pool. Connections are opened lazily, so building a
/// client never touches the network.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<Inner>,
}

struct Inner {
    pool: ConnectionPool,
    config: PgConfig,
}

/// Snapshot of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgPoolStatus {
    pub max_size: usize,
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

impl PgClient {
    /// Builds the pool without validating `config`; see [`PgConfig::build`].
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Unexpected`] if deadpool rejects the pool settings.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(custom_hooks::establish);
        let manager =
            AsyncDieselConnectionManager::new_with_config(&config.postgres_url, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_create(Hook::sync_fn(custom_hooks::after_create))
            .post_recycle(Hook::sync_fn(custom_hooks::after_recycle))
            .build()
            .map_err(|e| PgError::Unexpected(format!("cannot build connection pool: {e}").into()))?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            database_url = %config.database_url_masked(),
            max_connections = config.postgres_max_connections,
            "Database pool created"
        );

        Ok(Self {
            inner: Arc::new(Inner { pool, config }),
        })
    }

    /// Takes a connection from the pool, opening one if none is idle.
    ///
    /// # Errors
    ///
    /// Returns a timeout or connection error if no connection could be had.
    pub async fn get_connection(&self) -> PgResult<PgConn> {
        let started = Instant::now();
        let conn = self.get_pooled_connection().await.inspect_err(|error| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                %error,
                waited = ?started.elapsed(),
                "No database connection available"
            );
        })?;

        let waited = started.elapsed();
        if waited > SLOW_ACQUIRE {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                ?waited,
                waiting = self.pool_status().waiting,
                "Slow database connection acquisition"
            );
        }

        Ok(PgConn { conn })
    }

    pub(crate) async fn get_pooled_connection(&self) -> PgResult<PooledConnection> {
        Ok(self.inner.pool.get().await?)
    }

    pub fn pool_status(&self) -> PgPoolStatus {
        let status = self.inner.pool.status();
        PgPoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .field("pool", &self.pool_status())
            .finish()
    }
}

/// Pooled connection on which the repository traits are called.
///
/// Returns to the pool on drop.
///
/// ```ignore
/// let mut conn = pg_client.get_connection().await?;
/// let role = conn.find_user_role(user_id).await?;
/// ```
#[derive(Deref, DerefMut)]
pub struct PgConn {
    conn: PooledConnection,
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn").finish_non_exhaustive()
    }
}
