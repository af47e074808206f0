/// Shared error type for store, access, and analytics operations
///
/// Every fallible operation against the entity store returns `StoreError`.
/// The four non-database kinds map directly onto the HTTP statuses the API
/// layer serves (404, 403, 409, 422); `Database` covers everything else and
/// is never exposed verbatim to clients.
///
/// # Example
///
/// ```
/// use projecthub_shared::error::StoreError;
///
/// let err = StoreError::Forbidden("not a member of this project".to_string());
/// assert!(err.to_string().contains("not a member"));
/// ```

use uuid::Uuid;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Unified error type for the entity store and the components built on it
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entity id has no matching row
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Principal fails the access or manage check
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation (duplicate membership, duplicate email/username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation would violate a store invariant (sole owner removal,
    /// task parent cycle, self-deactivation)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Shorthand for a forbidden-project error with a consistent message
    pub fn project_forbidden(project_id: Uuid) -> Self {
        StoreError::Forbidden(format!("not authorized to access project {}", project_id))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("resource"),
            sqlx::Error::Database(db_err) => {
                // Unique constraint violations become conflicts so callers
                // can surface a 409 instead of a 500.
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or("unique constraint");
                    return StoreError::Conflict(format!("duplicate value for {}", constraint));
                }
                StoreError::Database(sqlx::Error::Database(db_err))
            }
            other => StoreError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::NotFound("task");
        assert_eq!(err.to_string(), "task not found");

        let err = StoreError::InvalidState("task parent cycle".to_string());
        assert_eq!(err.to_string(), "invalid state: task parent cycle");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_project_forbidden_mentions_id() {
        let id = Uuid::new_v4();
        let err = StoreError::project_forbidden(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
