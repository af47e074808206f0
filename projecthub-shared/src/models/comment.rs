/// Task comment model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Comment on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for posting a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub content: String,
}

impl Comment {
    /// Posts a comment on a task
    pub async fn create<'e, E>(
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
        data: CreateComment,
    ) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO task_comments (task_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(data.content)
        .fetch_one(executor)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, content, created_at, updated_at
            FROM task_comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(comment)
    }

    /// Lists comments on a task, oldest first
    pub async fn list_by_task<'e, E>(executor: E, task_id: Uuid) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, content, created_at, updated_at
            FROM task_comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(comments)
    }

    /// Rewrites a comment's content
    pub async fn update_content<'e, E>(executor: E, id: Uuid, content: String) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE task_comments
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, task_id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(executor)
        .await?
        .ok_or(StoreError::NotFound("comment"))?;

        Ok(comment)
    }

    /// Deletes a comment
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> StoreResult<bool>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM task_comments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(StoreError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
