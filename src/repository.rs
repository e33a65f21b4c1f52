use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{NewUser, Role, User, UserUpdate};

#[derive(Debug, Error)]
pub enum RepoError {
    /// A user with the same email already exists.
    #[error("user with email '{0}' already exists")]
    Conflict(String),
    /// A stored row could not be mapped back to a `User`.
    #[error("corrupt user record '{id}': {reason}")]
    Corrupt { id: String, reason: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// The user directory. The API guard reads it to confirm that a session's subject
/// still exists, is enabled, and still holds the role it claims. The admin
/// endpoints write to it.
///
/// **Send + Sync + async_trait** keep `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    // Fails with `RepoError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;
    // Returns the updated user, or None when no account has that email.
    async fn set_role(&self, email: &str, role: Role) -> Result<Option<User>, RepoError>;
    // Applies the set fields of `update`. None when the id is unknown.
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>, RepoError>;
    // Returns false when the id is unknown.
    async fn disable_user(&self, id: &str) -> Result<bool, RepoError>;
    // Returns false when the id is unknown.
    async fn delete_user(&self, id: &str) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The shared handle to the user directory.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres ---

/// Row shape of `public.profiles`. The role is stored as text and parsed on read.
#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: Option<String>,
    role: String,
    disabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|reason| RepoError::Corrupt {
            id: row.id.clone(),
            reason,
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            role,
            disabled: row.disabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, display_name, role, disabled, created_at, updated_at";

/// PostgresRepository
///
/// `Repository` backed by the `profiles` table (see `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM profiles ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// create_user
    ///
    /// Relies on the unique index on `lower(email)`; a violation maps to `Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let result = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO profiles (id, email, display_name, role) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => User::try_from(row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepoError::Conflict(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE profiles SET role = $2, updated_at = now() \
             WHERE lower(email) = lower($1) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE profiles SET \
             display_name = CASE WHEN $2 THEN $3 ELSE display_name END, \
             role = COALESCE($4, role), \
             updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.display_name.is_some())
        .bind(update.display_name.flatten())
        .bind(update.role.map(Role::as_str))
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn disable_user(&self, id: &str) -> Result<bool, RepoError> {
        let result =
            sqlx::query("UPDATE profiles SET disabled = true, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// --- In-memory ---

/// InMemoryRepository
///
/// `Repository` kept in a map. Used for local runs without `DATABASE_URL` and in tests.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: &str) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepoError::Conflict(user.email));
        }

        let now = Utc::now();
        let created = User {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            disabled: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<User>, RepoError> {
        let mut users = self.users.write().await;
        let Some(user) = users
            .values_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        else {
            return Ok(None);
        };

        user.role = role;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn disable_user(&self, id: &str) -> Result<bool, RepoError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(user) => {
                user.disabled = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>, RepoError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };

        if let Some(display_name) = update.display_name {
            user.display_name = display_name;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &str) -> Result<bool, RepoError> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}
