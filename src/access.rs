use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    models::{Identity, Role},
    policy::{AccessPolicy, RouteClass},
    session::resolve_identity,
};

/// AccessDecision
///
/// The single outcome reached for a request: it is either let through or
/// redirected, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// No usable session. `location` carries the original path as `callbackUrl`.
    RedirectToSignIn { location: String },
    /// Signed in, but this page belongs to another role (or is the legacy dashboard).
    RedirectToHome { location: String },
}

impl AccessDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToSignIn { location }
            | AccessDecision::RedirectToHome { location } => Some(location),
        }
    }
}

/// decide
///
/// Pure combination of a route class and the (possibly absent) identity.
pub fn decide(
    policy: &AccessPolicy,
    class: RouteClass,
    path: &str,
    identity: Option<&Identity>,
) -> AccessDecision {
    if class == RouteClass::Public {
        return AccessDecision::Allow;
    }

    let Some(identity) = identity else {
        return AccessDecision::RedirectToSignIn {
            location: policy.sign_in_location(path),
        };
    };

    let home = |role: Role| AccessDecision::RedirectToHome {
        location: policy.home_for(role).to_string(),
    };

    match class {
        RouteClass::AdminOnly if identity.role != Role::Admin => home(Role::Client),
        RouteClass::ClientOnly if identity.role != Role::Client => home(Role::Admin),
        RouteClass::NeedsRedirect => home(identity.role),
        _ => AccessDecision::Allow,
    }
}

/// Classifies `path` and decides in one step.
pub fn evaluate(policy: &AccessPolicy, path: &str, identity: Option<&Identity>) -> AccessDecision {
    decide(policy, policy.classify(path), path, identity)
}

/// access_gate
///
/// Global middleware applying the access decision to every request. Allowed
/// requests are forwarded untouched; everything else becomes a 307 redirect.
pub async fn access_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let identity = resolve_identity(
        request.headers(),
        state.sessions.as_ref(),
        &state.config.session_cookies,
    );

    match evaluate(&state.config.policy, &path, identity.as_ref()) {
        AccessDecision::Allow => next.run(request).await,
        AccessDecision::RedirectToSignIn { location } => {
            tracing::debug!(%path, %location, "no session, redirecting to sign-in");
            Redirect::temporary(&location).into_response()
        }
        AccessDecision::RedirectToHome { location } => {
            tracing::debug!(%path, %location, "role mismatch, redirecting to role home");
            Redirect::temporary(&location).into_response()
        }
    }
}
