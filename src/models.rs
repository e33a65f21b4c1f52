use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Identity & Roles ---

/// Role
///
/// The RBAC claim carried by every session. A user is either staff (`admin`)
/// or a customer of the studio (`client`). Serialized lowercase on the wire,
/// inside session tokens and in the `profiles.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Identity
///
/// The read-only identity decoded from a verified session token.
/// It is never persisted by the access layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Identity {
    /// Subject id issued by the identity provider (Firebase uid).
    pub subject: String,
    pub email: String,
    pub role: Role,
}

/// User
///
/// A record in the user directory (`public.profiles`). The directory is the
/// session store consulted by the API guard: it holds the current role and
/// whether the account has been disabled since the token was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub disabled: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NewUser
///
/// Internal insert payload handed to the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

/// UserUpdate
///
/// Internal partial update handed to the repository. `None` leaves a field as
/// it is; `display_name: Some(None)` clears the name.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub display_name: Option<Option<String>>,
    pub role: Option<Role>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Input for POST /api/auth/admin/users. Role defaults to `client`.
#[derive(Debug, Clone, Default, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

/// UpdateRoleRequest
///
/// Input for POST /api/auth/admin. Both fields are required; they are optional
/// here so that a missing field maps to a 400 with a readable message.
#[derive(Debug, Clone, Default, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// UpdateUserRequest
///
/// Input for PUT /api/auth/admin/users/{id}. Absent fields are left unchanged;
/// an empty `displayName` clears it.
#[derive(Debug, Clone, Default, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

/// RoleLookupQuery
///
/// Query string for GET /api/auth/admin.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RoleLookupQuery {
    /// Email of the account to look up.
    pub email: Option<String>,
}

/// UploadUrlRequest
///
/// Input for POST /api/upload-url.
#[derive(Debug, Clone, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UploadUrlRequest {
    #[serde(default)]
    pub file_name: String,
    pub file_type: Option<String>,
    /// Size in bytes the client will upload. When given it must not exceed
    /// `MAX_UPLOAD_BYTES` and becomes the signed `Content-Length`.
    pub file_size: Option<u64>,
}

// --- Response Payloads (Output Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserRoleResponse {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UploadUrlResponse {
    /// Presigned PUT URL, valid for ten minutes.
    pub url: String,
    /// Object key the file will be stored under.
    pub key: String,
}

/// HomeSummary
///
/// Landing payload for the role homes (`/admin` and `/home`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HomeSummary {
    pub email: String,
    pub role: Role,
    pub home: String,
}
