use crate::{
    AppState,
    error::ApiError,
    guard::{AdminSession, AuthSession, ClientSession},
    models::{
        CreateUserRequest, HomeSummary, Identity, NewUser, Role, RoleLookupQuery,
        SuccessResponse, UpdateRoleRequest, UpdateUserRequest, UploadUrlRequest,
        UploadUrlResponse, User, UserRoleResponse, UserUpdate,
    },
    storage::{MAX_UPLOAD_BYTES, receipt_key},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Trims a required string field; empty counts as missing.
fn required_field(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// --- Session & Homes ---

/// get_session
///
/// [Authenticated Route] The caller's current identity as held in the directory.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = Identity),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(AuthSession(session): AuthSession) -> Json<Identity> {
    Json(Identity {
        subject: session.subject,
        email: session.email,
        role: session.role,
    })
}

/// admin_home
///
/// [Admin Page] Landing payload for staff. The access gate has already
/// redirected tokens without the admin claim; the guard then confirms the
/// directory still lists the caller as an admin.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin home", body = HomeSummary),
        (status = 401, description = "No longer an admin")
    )
)]
pub async fn admin_home(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Json<HomeSummary> {
    Json(HomeSummary {
        home: state.config.policy.home_for(Role::Admin).to_string(),
        email: session.email,
        role: session.role,
    })
}

/// client_home
///
/// [Client Page] Landing payload for clients. The access gate has already
/// redirected admin tokens to `/admin`.
#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Client home", body = HomeSummary),
        (status = 401, description = "No longer a client")
    )
)]
pub async fn client_home(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
) -> Json<HomeSummary> {
    Json(HomeSummary {
        home: state.config.policy.home_for(Role::Client).to_string(),
        email: session.email,
        role: session.role,
    })
}

// --- User Administration ---

/// get_user_role
///
/// [Admin API] Looks up the role held by an account.
#[utoipa::path(
    get,
    path = "/api/auth/admin",
    params(RoleLookupQuery),
    responses(
        (status = 200, description = "Role found", body = UserRoleResponse),
        (status = 400, description = "Missing email"),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user_role(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
    Query(query): Query<RoleLookupQuery>,
) -> Result<Json<UserRoleResponse>, ApiError> {
    let email = required_field(query.email)
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let user = state
        .repo
        .get_user_by_email(&email)
        .await
        .map_err(|e| ApiError::from_repo("Failed to get user role", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserRoleResponse {
        uid: user.id,
        email: user.email,
        role: user.role,
    }))
}

/// update_user_role
///
/// [Admin API] Changes an account's role. Takes effect on the account's next
/// guarded request, since the guard reads the directory rather than the token.
#[utoipa::path(
    post,
    path = "/api/auth/admin",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = SuccessResponse),
        (status = 400, description = "Missing email or role"),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_user_role(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(email), Some(role)) = (required_field(payload.email), payload.role) else {
        return Err(ApiError::BadRequest("Email and role are required".to_string()));
    };

    state
        .repo
        .set_role(&email, role)
        .await
        .map_err(|e| ApiError::from_repo("Failed to update user role", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(by = %admin.subject, %email, %role, "user role updated");
    Ok(Json(SuccessResponse { success: true }))
}

/// list_users
///
/// [Admin API] Every account in the directory, newest first.
#[utoipa::path(
    get,
    path = "/api/auth/admin/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Not an admin")
    )
)]
pub async fn list_users(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .repo
        .list_users()
        .await
        .map_err(|e| ApiError::from_repo("Failed to list users", e))?;
    Ok(Json(users))
}

/// create_user
///
/// [Admin API] Adds an account to the directory. Credentials stay with the
/// identity provider; this only records who the user is and what role they hold.
#[utoipa::path(
    post,
    path = "/api/auth/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Missing email"),
        (status = 401, description = "Not an admin"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = required_field(payload.email)
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let new_user = NewUser {
        id: Uuid::new_v4().simple().to_string(),
        email,
        display_name: required_field(payload.display_name),
        role: payload.role.unwrap_or(Role::Client),
    };

    let user = state
        .repo
        .create_user(new_user)
        .await
        .map_err(|e| ApiError::from_repo("Failed to create user", e))?;

    tracing::info!(by = %admin.subject, id = %user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// disable_user
///
/// [Admin API] Disables an account. Outstanding session tokens stop passing the
/// API guard immediately.
#[utoipa::path(
    post,
    path = "/api/auth/admin/users/{id}/disable",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Disabled", body = SuccessResponse),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn disable_user(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let disabled = state
        .repo
        .disable_user(&id)
        .await
        .map_err(|e| ApiError::from_repo("Failed to disable user", e))?;

    if !disabled {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(by = %admin.subject, %id, "user disabled");
    Ok(Json(SuccessResponse { success: true }))
}

/// get_user
///
/// [Admin API] One account from the directory.
#[utoipa::path(
    get,
    path = "/api/auth/admin/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .repo
        .get_user(&id)
        .await
        .map_err(|e| ApiError::from_repo("Failed to get user", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// update_user
///
/// [Admin API] Changes an account's display name and/or role. Fields left out
/// of the body keep their current value.
#[utoipa::path(
    put,
    path = "/api/auth/admin/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = SuccessResponse),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_user(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let update = UserUpdate {
        display_name: payload.display_name.map(|name| required_field(Some(name))),
        role: payload.role,
    };

    state
        .repo
        .update_user(&id, update)
        .await
        .map_err(|e| ApiError::from_repo("Failed to update user", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(by = %admin.subject, %id, "user updated");
    Ok(Json(SuccessResponse { success: true }))
}

/// delete_user
///
/// [Admin API] Removes an account from the directory. Its sessions fail the
/// API guard from then on.
#[utoipa::path(
    delete,
    path = "/api/auth/admin/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 401, description = "Not an admin"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn delete_user(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_user(&id)
        .await
        .map_err(|e| ApiError::from_repo("Failed to delete user", e))?;

    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(by = %admin.subject, %id, "user deleted");
    Ok(Json(SuccessResponse { success: true }))
}

// --- Receipts ---

/// get_upload_url
///
/// [Authenticated Route] Presigned URL for uploading a receipt straight to S3.
/// The object lands under `receipts/` and the URL expires after ten minutes.
/// A declared `fileSize` is capped at `MAX_UPLOAD_BYTES` and signed into the URL.
#[utoipa::path(
    post,
    path = "/api/upload-url",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "URL", body = UploadUrlResponse),
        (status = 400, description = "Missing or unusable fileName, or file too large"),
        (status = 401, description = "Unknown or disabled account"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn get_upload_url(
    AuthSession(session): AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<UploadUrlRequest>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let key = receipt_key(payload.file_name.trim())
        .ok_or_else(|| ApiError::BadRequest("fileName is required".to_string()))?;

    if payload.file_size.is_some_and(|size| size > MAX_UPLOAD_BYTES) {
        return Err(ApiError::BadRequest(
            "fileSize exceeds the 10 MB limit".to_string(),
        ));
    }

    let content_type = payload
        .file_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let url = state
        .storage
        .presign_upload(&key, content_type, payload.file_size)
        .await
        .map_err(|e| ApiError::internal("Failed to generate upload URL", e))?;

    tracing::debug!(subject = %session.subject, %key, "upload url issued");
    Ok(Json(UploadUrlResponse { url, key }))
}
