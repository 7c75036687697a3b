//! API module for the attestation gateway

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new().route("/v1/attest/hello", get(handlers::hello));

    Router::new()
        .route("/health", get(health))
        .route("/v1/attest/place", post(handlers::place_token))
        // GET also answers HEAD
        .route("/v1/attest/files/*path", get(handlers::serve_file))
        .merge(middleware::protect(protected, state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
