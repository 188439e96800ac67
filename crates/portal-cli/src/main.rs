#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;
mod telemetry;

use std::process::ExitCode;

use anyhow::Context;
use axum::Router;
use portal_server::handler::{CustomRoutes, routes};
use portal_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
use portal_server::service::ServiceState;

use crate::config::Cli;

pub const TRACING_TARGET_SERVER_STARTUP: &str = "portal_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "portal_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "portal_cli::config";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Tracing may not be installed yet if startup failed early.
            if tracing::enabled!(target: TRACING_TARGET_SERVER_SHUTDOWN, tracing::Level::ERROR) {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %format!("{error:#}"),
                    "Portal exited with an error"
                );
            } else {
                eprintln!("error: {error:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    telemetry::init_tracing()?;

    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service)
        .await
        .context("cannot initialize services")?;

    server::serve(app(state, &cli.recovery), cli.server).await?;
    Ok(())
}

/// Built-in routes wrapped, from the inside out, in observability and recovery.
fn app(state: ServiceState, recovery: &RecoveryConfig) -> Router {
    routes(CustomRoutes::new(), state.clone())
        .with_state(state)
        .with_observability()
        .with_recovery(recovery)
}
