/// User management endpoints
///
/// # Endpoints
///
/// - `GET /v1/users` - List users (admin only)
/// - `GET /v1/users/:id` - Get one user (self or admin)
/// - `PUT /v1/users/:id` - Update a user (self or admin)
/// - `DELETE /v1/users/:id` - Deactivate an account (admin, not self)
/// - `POST /v1/users/:id/activate` - Reactivate an account (admin)
///
/// Accounts are deactivated, never hard-deleted: their rows anchor
/// foreign keys from tasks and comments.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use projecthub_shared::auth::password;
use projecthub_shared::models::user::{UpdateUser, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Pagination {
    /// Clamps limit to a sane range
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

/// User update request
///
/// Profile fields plus an optional plaintext password, which is
/// strength-checked and hashed before it reaches the store.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
}

fn require_admin(user: &User) -> ApiResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "administrator privileges required".to_string(),
        ))
    }
}

/// Lists users, newest first (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<User>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&principal)?;

    let users = User::list(&state.db, page.limit(), page.offset()).await?;
    Ok(Json(users))
}

/// Gets one user by ID (self or admin)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    if principal.id != id {
        require_admin(&principal)?;
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(Json(user))
}

/// Updates a user's profile, optionally changing the password
///
/// Users may edit themselves; admins may edit anyone.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<User>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    if principal.id != id {
        require_admin(&principal)?;
    }

    let password_hash = match req.password {
        Some(ref plaintext) => {
            password::validate_password_strength(plaintext).map_err(|e| {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: "password".to_string(),
                    message: e,
                }])
            })?;
            Some(password::hash_password(plaintext)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            email: req.email,
            username: req.username,
            full_name: req.full_name,
            password_hash,
        },
    )
    .await?;

    Ok(Json(user))
}

/// Deactivates an account (admin only, never your own)
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(principal): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_admin(&principal)?;

    if principal.id == id {
        return Err(ApiError::InvalidState(
            "cannot deactivate your own account".to_string(),
        ));
    }

    let user = User::set_active(&state.db, id, false).await?;
    Ok(Json(user))
}

/// Reactivates an account (admin only)
pub async fn activate_user(
    State(state): State<AppState>,
    Extension(principal): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_admin(&principal)?;

    let user = User::set_active(&state.db, id, true).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.limit(), 50);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_pagination_clamping() {
        let page: Pagination =
            serde_json::from_str(r#"{"limit": 5000, "offset": -3}"#).unwrap();
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_update_request_sparse_fields() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"full_name": "New Name"}"#).unwrap();
        assert_eq!(req.full_name.as_deref(), Some("New Name"));
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }
}
