#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod error;
pub mod model;
pub mod query;
mod schema;
pub mod types;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, MigrationResult, PgClient, PgClientMigrationExt, PgConfig, PgConn,
    PgPoolStatus, PooledConnection,
};
pub use crate::error::{PgError, PgResult};

/// Pool setup and connection acquisition.
pub const TRACING_TARGET_CONNECTION: &str = "portal_postgres::connection";

/// Repository queries.
pub const TRACING_TARGET_QUERY: &str = "portal_postgres::queries";

/// Schema migrations.
pub const TRACING_TARGET_MIGRATION: &str = "portal_postgres::migrations";

pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();
