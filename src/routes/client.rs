use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Client Router Module
///
/// The client portal. `/home` is client-only in the access policy, so admin
/// tokens are redirected to `/admin` before reaching these handlers, and the
/// handlers re-check the role against the directory.
pub fn client_routes() -> Router<AppState> {
    Router::new().route("/home", get(handlers::client_home))
}
