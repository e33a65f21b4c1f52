use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints on the access policy's public allow-list.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
}
