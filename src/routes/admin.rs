use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Staff pages and the user administration API.
///
/// `/admin` is admin-only in the access policy. The `/api/auth/admin` endpoints
/// sit under the public `/api/auth` prefix (the identity provider's namespace),
/// so the access gate lets them through and every handler takes an
/// `AdminSession`, which answers 401 JSON instead of redirecting.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        .route("/admin", get(handlers::admin_home))
        // GET /api/auth/admin?email=...  look up a role
        // POST /api/auth/admin           change a role
        .route(
            "/api/auth/admin",
            get(handlers::get_user_role).post(handlers::update_user_role),
        )
        // GET/POST /api/auth/admin/users
        .route(
            "/api/auth/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        // GET/PUT/DELETE /api/auth/admin/users/{id}
        .route(
            "/api/auth/admin/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // POST /api/auth/admin/users/{id}/disable
        .route(
            "/api/auth/admin/users/{id}/disable",
            post(handlers::disable_user),
        )
}
