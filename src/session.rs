use std::sync::Arc;

use axum::http::{HeaderMap, header};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Identity, Role};

/// Claims
///
/// Payload of a session token as issued by the sign-in flow. `role` must be one of
/// the known roles; a token without one does not decode.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity provider's user id.
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token has expired")]
    Expired,
    #[error("session token is invalid: {0}")]
    Invalid(String),
}

/// SessionProvider
///
/// Verifies a raw session token and yields the identity it carries.
pub trait SessionProvider: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, SessionError>;
}

pub type SessionState = Arc<dyn SessionProvider>;

/// JwtSessionProvider
///
/// HS256 session tokens signed with the shared session secret. Expiry is always checked.
pub struct JwtSessionProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl SessionProvider for JwtSessionProvider {
    fn verify(&self, token: &str) -> Result<Identity, SessionError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            }
        })?;

        Ok(Identity {
            subject: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

/// session_token
///
/// Finds the raw session token: the first configured cookie that is present,
/// then an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap, cookie_names: &[String]) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = cookie_names.iter().find_map(|name| jar.get(name)) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// resolve_identity
///
/// Request headers to identity. Any failure (no token, bad signature, expired,
/// unknown role) is reported as `None`.
pub fn resolve_identity(
    headers: &HeaderMap,
    provider: &dyn SessionProvider,
    cookie_names: &[String],
) -> Option<Identity> {
    let token = session_token(headers, cookie_names)?;

    match provider.verify(&token) {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected");
            None
        }
    }
}
