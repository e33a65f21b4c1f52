use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, StatusCode},
    middleware,
    response::IntoResponse,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access control: session resolution, route classification, decisions, API guard.
pub mod access;
pub mod guard;
pub mod policy;
pub mod session;

// Application services and components.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

pub mod routes;
use routes::{admin, authenticated, client, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use session::{JwtSessionProvider, SessionState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::admin_home, handlers::client_home,
        handlers::get_user_role, handlers::update_user_role, handlers::list_users,
        handlers::create_user, handlers::get_user, handlers::update_user,
        handlers::delete_user, handlers::disable_user, handlers::get_upload_url,
    ),
    components(
        schemas(
            models::Role, models::Identity, models::User, models::CreateUserRequest,
            models::UpdateRoleRequest, models::UpdateUserRequest, models::UploadUrlRequest,
            models::UploadUrlResponse, models::UserRoleResponse, models::SuccessResponse,
            models::HomeSummary, error::ErrorBody,
        )
    ),
    tags(
        (name = "jse-portal", description = "Jet Set Edit admin portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable services handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// User directory (session store).
    pub repo: RepositoryState,
    /// Receipt object storage.
    pub storage: StorageState,
    /// Session token verifier.
    pub sessions: SessionState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

/// create_router
///
/// Assembles all route groups behind the access gate, then the observability
/// layers and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(client::client_routes())
        .merge(admin::admin_routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            error::expose_error_details,
        ))
        // The gate wraps every route and the fallback, so unknown paths are
        // classified like any other.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access::access_gate,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, URI and the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
