//! Turns handler panics and request timeouts into JSON 500 responses.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::{Error, ErrorKind};
use crate::utility::tracing_targets::{
    TRACING_TARGET_RECOVERY_ERROR, TRACING_TARGET_RECOVERY_PANIC,
};

/// How long a request may run before it is abandoned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RecoveryConfig {
    /// Request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)
    )]
    pub request_timeout: u64,
}

impl RecoveryConfig {
    pub fn with_timeout_secs(request_timeout: u64) -> Self {
        Self { request_timeout }
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::with_timeout_secs(30)
    }
}

/// Adds panic and timeout recovery to a [`Router`].
pub trait RouterRecoveryExt<S> {
    /// Wraps every route so that a panic or an overrun yields a JSON 500.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        self.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(timed_out))
                .layer(CatchPanicLayer::custom(panicked))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
    }
}

async fn timed_out(error: BoxError) -> Error<'static> {
    if error.is::<Elapsed>() {
        tracing::error!(target: TRACING_TARGET_RECOVERY_ERROR, "Request timed out");
        return ErrorKind::InternalServerError.with_message("The request took too long");
    }

    tracing::error!(
        target: TRACING_TARGET_RECOVERY_ERROR,
        %error,
        "Middleware failed"
    );
    ErrorKind::InternalServerError.into_error()
}

fn panicked(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "non-string panic payload".to_owned(), |s| (*s).to_owned()),
    };

    tracing::error!(
        target: TRACING_TARGET_RECOVERY_PANIC,
        panic = %message,
        "Handler panicked"
    );
    ErrorKind::InternalServerError.into_response()
}
