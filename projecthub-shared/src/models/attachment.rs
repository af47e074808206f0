/// Task attachment model and database operations
///
/// Rows record file metadata only; the bytes live wherever `file_path`
/// points and are managed outside the store.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_attachments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     filename VARCHAR(255) NOT NULL,
///     file_path VARCHAR(1024) NOT NULL,
///     file_size BIGINT NOT NULL,
///     content_type VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// File attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,

    /// User who uploaded the file
    pub user_id: Uuid,

    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an uploaded file
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachment {
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
}

impl Attachment {
    /// Records an attachment on a task
    pub async fn create<'e, E>(
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
        data: CreateAttachment,
    ) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO task_attachments (task_id, user_id, filename, file_path,
                                          file_size, content_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, task_id, user_id, filename, file_path, file_size,
                      content_type, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(data.filename)
        .bind(data.file_path)
        .bind(data.file_size)
        .bind(data.content_type)
        .fetch_one(executor)
        .await?;

        Ok(attachment)
    }

    /// Finds an attachment by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, task_id, user_id, filename, file_path, file_size,
                   content_type, created_at
            FROM task_attachments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(attachment)
    }

    /// Lists attachments on a task, oldest first
    pub async fn list_by_task<'e, E>(executor: E, task_id: Uuid) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, task_id, user_id, filename, file_path, file_size,
                   content_type, created_at
            FROM task_attachments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(attachments)
    }

    /// Deletes an attachment record
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> StoreResult<bool>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM task_attachments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(StoreError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
