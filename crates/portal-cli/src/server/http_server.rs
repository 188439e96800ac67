use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::shutdown::shutdown_signal;
use super::{ServerError, ServerResult};
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Serves `app` until a shutdown signal arrives.
///
/// After the signal, in-flight requests get `SHUTDOWN_TIMEOUT` to finish;
/// whatever is still running then is abandoned.
///
/// # Errors
///
/// Fails on invalid settings, when the address cannot be bound, or when the
/// server itself fails.
pub async fn serve_http(app: Router, config: ServerConfig) -> ServerResult<()> {
    config
        .validate()
        .map_err(|error| ServerError::Config(format!("{error:#}")))?;

    let addr = config.server_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(target: TRACING_TARGET_SERVER_STARTUP, %addr, "Listening");
    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Listening on every interface, make sure a firewall or proxy sits in front"
        );
    }

    let started = Instant::now();
    let result = run_until_drained(listener, app, config.shutdown_timeout()).await;
    let uptime_secs = started.elapsed().as_secs();

    match result {
        Ok(()) => {
            tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, uptime_secs, "Stopped");
            Ok(())
        }
        Err(source) => {
            let error = ServerError::Serve(source);
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                %error,
                hint = error.hint(),
                uptime_secs,
                "Server failed"
            );
            Err(error)
        }
    }
}

async fn run_until_drained(
    listener: TcpListener,
    app: Router,
    grace: Duration,
) -> std::io::Result<()> {
    let signalled = Arc::new(Notify::new());
    let graceful = {
        let signalled = Arc::clone(&signalled);
        async move {
            shutdown_signal().await;
            signalled.notify_one();
        }
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result,
        () = signalled.notified() => {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                grace_secs = grace.as_secs(),
                "Draining in-flight requests"
            );

            tokio::time::timeout(grace, server).await.unwrap_or_else(|_| {
                tracing::warn!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    "Grace period elapsed, abandoning remaining requests"
                );
                Ok(())
            })
        }
    }
}
