//! Liveness handler.

use axum::routing::get;
use axum::{Json, Router};

use super::response::HealthResponse;
use crate::service::ServiceState;

/// Reports that the process is serving requests.
///
/// Checks no dependency: a failing store must not take the portal out of the
/// load balancer, since anonymous pages keep working without it.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Returns a [`Router`] with the health route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/api/health", get(health))
}
