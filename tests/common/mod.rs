#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono::Utc;
use jse_portal::{
    AppConfig, AppState, InMemoryRepository, JwtSessionProvider, MockStorageService,
    RepositoryState, create_router,
    models::{NewUser, Role, User, UserUpdate},
    repository::{RepoError, Repository},
    session::Claims,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::util::ServiceExt;

// --- Fixtures ---

pub const TEST_SECRET: &str = "test-session-secret-1234567890";
pub const SESSION_COOKIE: &str = "next-auth.session-token";

pub const ADMIN_ID: &str = "admin-uid";
pub const ADMIN_EMAIL: &str = "editor@jetsetedit.com";
pub const CLIENT_ID: &str = "client-uid";
pub const CLIENT_EMAIL: &str = "producer@client.com";

pub fn user(id: &str, email: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        email: email.to_string(),
        display_name: None,
        role,
        disabled: false,
        created_at: now,
        updated_at: now,
    }
}

/// Directory holding one admin and one client.
pub fn seeded_repo() -> Arc<InMemoryRepository> {
    Arc::new(InMemoryRepository::with_users([
        user(ADMIN_ID, ADMIN_EMAIL, Role::Admin),
        user(CLIENT_ID, CLIENT_EMAIL, Role::Client),
    ]))
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

pub fn sign<T: Serialize>(claims: &T, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Session token expiring `exp_offset` seconds from now (negative for expired).
pub fn mint_token(sub: &str, email: &str, role: Role, exp_offset: i64) -> String {
    let now = now_secs();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        role,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };
    sign(&claims, TEST_SECRET)
}

pub fn admin_token() -> String {
    mint_token(ADMIN_ID, ADMIN_EMAIL, Role::Admin, 3600)
}

pub fn client_token() -> String {
    mint_token(CLIENT_ID, CLIENT_EMAIL, Role::Client, 3600)
}

/// Token whose role claim is not a known role.
pub fn unknown_role_token() -> String {
    let now = now_secs();
    sign(
        &serde_json::json!({
            "sub": CLIENT_ID,
            "email": CLIENT_EMAIL,
            "role": "owner",
            "iat": now,
            "exp": now + 3600,
        }),
        TEST_SECRET,
    )
}

// --- Failing directory ---

/// Directory that is always unreachable.
pub struct UnavailableRepo;

fn outage() -> RepoError {
    RepoError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl Repository for UnavailableRepo {
    async fn get_user(&self, _id: &str) -> Result<Option<User>, RepoError> {
        Err(outage())
    }
    async fn get_user_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
        Err(outage())
    }
    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        Err(outage())
    }
    async fn create_user(&self, _user: NewUser) -> Result<User, RepoError> {
        Err(outage())
    }
    async fn set_role(&self, _email: &str, _role: Role) -> Result<Option<User>, RepoError> {
        Err(outage())
    }
    async fn update_user(&self, _id: &str, _update: UserUpdate) -> Result<Option<User>, RepoError> {
        Err(outage())
    }
    async fn disable_user(&self, _id: &str) -> Result<bool, RepoError> {
        Err(outage())
    }
    async fn delete_user(&self, _id: &str) -> Result<bool, RepoError> {
        Err(outage())
    }
}

// --- App wiring ---

pub fn test_config() -> AppConfig {
    AppConfig {
        session_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn test_state(repo: RepositoryState, storage: MockStorageService) -> AppState {
    AppState {
        repo,
        storage: Arc::new(storage),
        sessions: Arc::new(JwtSessionProvider::new(TEST_SECRET)),
        config: test_config(),
    }
}

pub fn app() -> Router {
    create_router(test_state(seeded_repo(), MockStorageService::new()))
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(path: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
