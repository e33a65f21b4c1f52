use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

use crate::{
    config::{AppConfig, Env},
    repository::RepoError,
};

/// ErrorBody
///
/// JSON error envelope: `{ "error": "...", "details": "..." }`. `details` is only
/// sent when the server runs in `Env::Local` (see `expose_error_details`).
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// ApiError
///
/// Handler-level failures unrelated to access control.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Internal { message: String, details: String },
}

impl ApiError {
    /// Logs `cause` and wraps it behind a caller-facing message.
    pub fn internal(message: &str, cause: impl Display) -> Self {
        tracing::error!(error = %cause, "{message}");
        ApiError::Internal {
            message: message.to_string(),
            details: cause.to_string(),
        }
    }

    /// Maps repository failures; conflicts keep their message.
    pub fn from_repo(message: &str, err: RepoError) -> Self {
        match err {
            RepoError::Conflict(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::internal(message, other),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    /// Never writes `details` into the body. For 500s the detailed body rides
    /// along as a response extension for `expose_error_details` to pick up.
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let detailed = match self {
            ApiError::Internal { details, .. } => Some(ErrorBody {
                error: error.clone(),
                details: Some(details),
            }),
            _ => None,
        };

        let mut response = (
            status,
            Json(ErrorBody {
                error,
                details: None,
            }),
        )
            .into_response();
        if let Some(detailed) = detailed {
            response.extensions_mut().insert(detailed);
        }
        response
    }
}

/// expose_error_details
///
/// Middleware that re-renders 500 bodies with their `details` when running in
/// `Env::Local`. In production the extension is dropped unread.
pub async fn expose_error_details(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if config.env != Env::Local {
        return response;
    }

    let detailed = response.extensions().get::<ErrorBody>().cloned();
    match detailed {
        Some(detailed) => (response.status(), Json(detailed)).into_response(),
        None => response,
    }
}
