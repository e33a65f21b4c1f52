use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Paths that fall through to `RouteClass::Authenticated`: any signed-in role
/// gets past the access gate.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/session
        // The caller's identity, confirmed against the user directory.
        .route("/api/session", get(handlers::get_session))
        // POST /api/upload-url
        // Presigned S3 URL for a receipt upload.
        .route("/api/upload-url", post(handlers::get_upload_url))
}
