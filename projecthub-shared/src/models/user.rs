/// User model and database operations
///
/// Users are the principals of the system. Accounts are created at
/// registration and deactivated (never hard-deleted) by an administrator;
/// the `is_admin` flag grants access to every project regardless of
/// membership.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     full_name VARCHAR(100) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, CreateUser {
///     email: "dev@example.com".to_string(),
///     username: "dev".to_string(),
///     full_name: "Dev Eloper".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// println!("created user {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Login/handle, unique across all users
    pub username: String,

    /// Display name
    pub full_name: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Deactivated accounts keep their rows but are refused by the API
    pub is_active: bool,

    /// System administrators can access every project
    pub is_admin: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub full_name: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
}

/// Field delta for updating a user
///
/// Only `Some` fields are written; everything else is left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
}

impl UpdateUser {
    /// True when no field is present (nothing to write)
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.full_name.is_none()
            && self.password_hash.is_none()
    }
}

impl User {
    /// Creates a new user account
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email or username is taken.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, full_name, password_hash,
                      is_active, is_admin, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.username)
        .bind(data.full_name)
        .bind(data.password_hash)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, password_hash,
                   is_active, is_admin, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (used by login)
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, password_hash,
                   is_active, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Lists users with pagination, newest first
    pub async fn list<'e, E>(executor: E, limit: i64, offset: i64) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, password_hash,
                   is_active, is_admin, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    /// Applies a field delta to a user row
    ///
    /// Builds the UPDATE statement from the fields present in `data`,
    /// binding each one individually.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the user does not exist,
    /// `StoreError::Conflict` if a new email/username collides.
    pub async fn update<'e, E>(executor: E, id: Uuid, data: UpdateUser) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        if data.is_empty() {
            return Self::find_by_id(executor, id)
                .await?
                .ok_or(StoreError::NotFound("user"));
        }

        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.full_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", full_name = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, email, username, full_name, password_hash, \
             is_active, is_admin, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(full_name) = data.full_name {
            q = q.bind(full_name);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        let user = q
            .fetch_optional(executor)
            .await?
            .ok_or(StoreError::NotFound("user"))?;

        Ok(user)
    }

    /// Activates or deactivates an account
    ///
    /// Deactivation is the system's "delete": the row stays for referential
    /// integrity, the account just stops authenticating.
    pub async fn set_active<'e, E>(executor: E, id: Uuid, active: bool) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, username, full_name, password_hash,
                      is_active, is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(active)
        .fetch_optional(executor)
        .await?
        .ok_or(StoreError::NotFound("user"))?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_user_is_empty() {
        assert!(UpdateUser::default().is_empty());

        let delta = UpdateUser {
            full_name: Some("New Name".to_string()),
            ..Default::default()
        };
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            username: "ab".to_string(),
            full_name: "A B".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("a@b.c"));
    }
}
