//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use rg_filter::{FailurePolicy, filter_router};
use rg_logout::logout_router;
use rg_store::StoreBackend;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Key looked up by the readiness check. Never written.
const READINESS_KEY: &str = "__readiness__";

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let logout = logout_router().with_state(state.logout_state());
    let filter = filter_router().with_state(state.filter_state());

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(logout)
        .merge(filter)
        .merge(health)
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "revoke-gate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    backend: StoreBackend,
    failure_policy: FailurePolicy,
}

/// Server information response.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    name: String,
    version: String,
}

/// Basic health check.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.store.backend(),
        failure_policy: state.config().failure_policy,
    })
}

/// Kubernetes liveness check.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness check.
///
/// Ready when the store answers a lookup within the command timeout.
async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let timeout: Duration = state.config().store.command_timeout;
    match tokio::time::timeout(timeout, state.store.is_revoked(READINESS_KEY)).await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            tracing::warn!(?timeout, "readiness check timed out");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
