use std::{env, sync::Arc};

use thiserror::Error;

use crate::policy::AccessPolicy;

/// Local-only session secret. Never accepted in production.
pub const LOCAL_SESSION_SECRET: &str = "jse-local-session-secret-do-not-use-in-prod";

/// Cookie names NextAuth uses for its session token (plain and `__Secure-` variants).
pub const DEFAULT_SESSION_COOKIES: [&str; 2] =
    ["next-auth.session-token", "__Secure-next-auth.session-token"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// AppConfig
///
/// Immutable configuration loaded once at start-up and shared through `AppState`.
/// The access policy lives here so the route classifier is built exactly once and
/// handed out by reference.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and error detail.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Postgres connection string. Absent only in local runs (in-memory directory).
    pub db_url: Option<String>,
    // HMAC secret used to verify session tokens.
    pub session_secret: String,
    // Cookie names searched for a session token, in order.
    pub session_cookies: Vec<String>,
    // S3 settings for receipt uploads. `s3_endpoint` is set for MinIO.
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    pub s3_bucket: String,
    // Route classification table.
    pub policy: Arc<AccessPolicy>,
}

/// Env
///
/// Runtime context switch between developer conveniences and hardened production.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            db_url: None,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_cookies: DEFAULT_SESSION_COOKIES.iter().map(|c| c.to_string()).collect(),
            s3_endpoint: Some("http://localhost:9000".to_string()),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "jse-receipts-test".to_string(),
            policy: Arc::new(AccessPolicy::default()),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production refuses to
    /// start without its secrets; local runs fall back to MinIO defaults and an
    /// in-memory user directory.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let mut session_cookies: Vec<String> =
            DEFAULT_SESSION_COOKIES.iter().map(|c| c.to_string()).collect();
        if let Some(extra) = optional("SESSION_COOKIE") {
            session_cookies.insert(0, extra);
        }

        let mut policy = AccessPolicy::default();
        if let Some(prefixes) = optional("PUBLIC_PATH_PREFIXES") {
            let extra = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    if p.starts_with('/') {
                        Ok(p.to_string())
                    } else {
                        Err(ConfigError::Invalid {
                            var: "PUBLIC_PATH_PREFIXES",
                            reason: format!("'{p}' does not start with '/'"),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            policy = policy.with_public_prefixes(extra);
        }

        let bind_addr = optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Ok(Self {
                env,
                bind_addr,
                db_url: optional("DATABASE_URL"),
                session_secret: optional("SESSION_SECRET")
                    .unwrap_or_else(|| LOCAL_SESSION_SECRET.to_string()),
                session_cookies,
                s3_endpoint: Some(
                    optional("S3_ENDPOINT").unwrap_or_else(|| "http://localhost:9000".to_string()),
                ),
                s3_region: optional("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                s3_key: optional("AWS_ACCESS_KEY_ID").unwrap_or_else(|| "admin".to_string()),
                s3_secret: optional("AWS_SECRET_ACCESS_KEY")
                    .unwrap_or_else(|| "password".to_string()),
                s3_bucket: optional("AWS_BUCKET_NAME")
                    .unwrap_or_else(|| "jse-receipts".to_string()),
                policy: Arc::new(policy),
            }),
            Env::Production => {
                let session_secret = required("SESSION_SECRET")?;
                if session_secret == LOCAL_SESSION_SECRET {
                    return Err(ConfigError::Invalid {
                        var: "SESSION_SECRET",
                        reason: "the local development secret cannot be used in production"
                            .to_string(),
                    });
                }

                Ok(Self {
                    env,
                    bind_addr,
                    db_url: Some(required("DATABASE_URL")?),
                    session_secret,
                    session_cookies,
                    s3_endpoint: optional("S3_ENDPOINT"),
                    s3_region: required("AWS_REGION")?,
                    s3_key: required("AWS_ACCESS_KEY_ID")?,
                    s3_secret: required("AWS_SECRET_ACCESS_KEY")?,
                    s3_bucket: required("AWS_BUCKET_NAME")?,
                    policy: Arc::new(policy),
                })
            }
        }
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}
