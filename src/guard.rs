use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    config::AppConfig,
    models::Role,
    repository::{Repository, RepositoryState},
    session::{SessionProvider, SessionState, resolve_identity},
};

/// Session
///
/// A verified caller, as confirmed against the user directory. `role` is the
/// directory's current role, which wins over the token's claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    pub email: String,
    pub role: Role,
}

/// Denied
///
/// Terminal response returned by the guard.
#[derive(Debug, Clone, PartialEq)]
pub struct Denied {
    pub status: StatusCode,
    pub body: Value,
}

impl Denied {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": "Unauthorized" }),
        }
    }
}

impl IntoResponse for Denied {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// GuardOutcome
///
/// Either the session to continue with, or the response to return right away.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Allowed(Session),
    Denied(Denied),
}

impl GuardOutcome {
    pub fn into_result(self) -> Result<Session, Denied> {
        match self {
            GuardOutcome::Allowed(session) => Ok(session),
            GuardOutcome::Denied(denied) => Err(denied),
        }
    }
}

/// authenticate
///
/// Resolves the session and checks it against the directory. No token, an
/// unknown or disabled subject, and a directory failure all deny.
pub async fn authenticate(
    headers: &HeaderMap,
    sessions: &dyn SessionProvider,
    repo: &dyn Repository,
    cookie_names: &[String],
) -> GuardOutcome {
    let Some(identity) = resolve_identity(headers, sessions, cookie_names) else {
        return GuardOutcome::Denied(Denied::unauthorized());
    };

    let user = match repo.get_user(&identity.subject).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(subject = %identity.subject, "session subject not in directory");
            return GuardOutcome::Denied(Denied::unauthorized());
        }
        Err(e) => {
            tracing::warn!(subject = %identity.subject, error = %e, "directory lookup failed, denying");
            return GuardOutcome::Denied(Denied::unauthorized());
        }
    };

    if user.disabled {
        tracing::warn!(subject = %user.id, "disabled account presented a session");
        return GuardOutcome::Denied(Denied::unauthorized());
    }

    GuardOutcome::Allowed(Session {
        subject: user.id,
        email: user.email,
        role: user.role,
    })
}

/// authorize
///
/// `authenticate` plus a role requirement.
pub async fn authorize(
    headers: &HeaderMap,
    sessions: &dyn SessionProvider,
    repo: &dyn Repository,
    cookie_names: &[String],
    required: Role,
) -> GuardOutcome {
    match authenticate(headers, sessions, repo, cookie_names).await {
        GuardOutcome::Allowed(session) if session.role != required => {
            tracing::warn!(
                subject = %session.subject,
                role = %session.role,
                required = %required,
                "role check failed"
            );
            GuardOutcome::Denied(Denied::unauthorized())
        }
        outcome => outcome,
    }
}

/// Runs the guard for an extractor. `required` of `None` accepts any role.
async fn guard_request<S>(parts: &Parts, state: &S, required: Option<Role>) -> GuardOutcome
where
    SessionState: FromRef<S>,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let sessions = SessionState::from_ref(state);
    let repo = RepositoryState::from_ref(state);
    let config = AppConfig::from_ref(state);
    let cookies = &config.session_cookies;

    match required {
        Some(role) => {
            authorize(&parts.headers, sessions.as_ref(), repo.as_ref(), cookies, role).await
        }
        None => authenticate(&parts.headers, sessions.as_ref(), repo.as_ref(), cookies).await,
    }
}

/// AuthSession Extractor
///
/// Any signed-in, enabled user. Rejects with the guard's 401.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Denied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        guard_request(parts, state, None)
            .await
            .into_result()
            .map(AuthSession)
    }
}

/// AdminSession Extractor
///
/// Guards staff pages and privileged mutations: the caller must currently be an
/// admin in the directory, whatever the token claims.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Denied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        guard_request(parts, state, Some(Role::Admin))
            .await
            .into_result()
            .map(AdminSession)
    }
}

/// ClientSession Extractor
///
/// The client portal's counterpart to `AdminSession`.
#[derive(Debug, Clone)]
pub struct ClientSession(pub Session);

impl<S> FromRequestParts<S> for ClientSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Denied;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        guard_request(parts, state, Some(Role::Client))
            .await
            .into_result()
            .map(ClientSession)
    }
}
