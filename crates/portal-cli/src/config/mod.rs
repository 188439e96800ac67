//! Command line and environment settings.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig      HOST, PORT, SHUTDOWN_TIMEOUT
//! ├── recovery: RecoveryConfig  REQUEST_TIMEOUT
//! └── service: ServiceConfig    POSTGRES_*, SESSION_*, SSO_*, APP_*
//! ```
//!
//! Every flag has an environment variable; a `.env` file in the working
//! directory is read first when the `dotenv` feature is on.

mod server;

use anyhow::Context;
use clap::Parser;
use portal_server::middleware::RecoveryConfig;
use portal_server::service::ServiceConfig;
pub use server::ServerConfig;

use crate::TRACING_TARGET_CONFIG;

#[derive(Debug, Clone, Parser)]
#[command(name = "portal", version)]
#[command(about = "Division portal session and permission server")]
pub struct Cli {
    #[clap(flatten)]
    pub server: ServerConfig,

    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Reads `.env`, then parses arguments with the environment as fallback.
    pub fn init() -> Self {
        #[cfg(feature = "dotenv")]
        if let Err(error) = dotenvy::dotenv()
            && !error.not_found()
        {
            // Tracing is not installed yet.
            eprintln!("warning: ignoring unreadable .env file: {error}");
        }

        Self::parse()
    }

    /// # Errors
    ///
    /// Names the group and the first setting that is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server.validate().context("invalid server settings")?;
        self.service.validate().context("invalid service settings")?;
        Ok(())
    }

    /// Logs the effective settings with secrets left out.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = std::process::id(),
            dotenv = cfg!(feature = "dotenv"),
            "Build"
        );

        self.server.log();

        let service = &self.service;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            app_env = %service.app_env,
            app_base_url = %service.app_base_url,
            request_timeout_secs = self.recovery.request_timeout,
            sign_in_enabled = service.identity.sso_client_id.is_some(),
            postgres_url = %service.postgres.database_url_masked(),
            postgres_max_connections = service.postgres.postgres_max_connections,
            "Service configuration"
        );
    }
}
