/// Task model and database operations
///
/// Tasks belong to exactly one project and may form a tree via
/// `parent_task_id`. Two invariants live here rather than in the schema:
///
/// - `completed_at` is set exactly once, when status first transitions to
///   `done` (`COALESCE(completed_at, NOW())` keeps the original value on
///   any later transition).
/// - Parent reassignment walks the chain to the root and rejects a cycle
///   with [`StoreError::InvalidState`]; the walk is bounded by tree depth.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'todo', 'in_progress', 'in_review', 'done', 'cancelled'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority priority NOT NULL DEFAULT 'medium',
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     creator_id UUID NOT NULL REFERENCES users(id),
///     parent_task_id UUID REFERENCES tasks(id) ON DELETE SET NULL,
///     estimated_hours INTEGER,
///     actual_hours INTEGER,
///     start_date TIMESTAMPTZ,
///     due_date TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     is_milestone BOOLEAN NOT NULL DEFAULT FALSE,
///     tags VARCHAR(500),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::Priority;
use crate::error::{StoreError, StoreResult};

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Done,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Open = still counts toward workload (not done, not cancelled)
    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,

    /// Parent in the task tree; None for top-level tasks
    pub parent_task_id: Option<Uuid>,

    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,

    /// Set exactly once, on the first transition into `done`
    pub completed_at: Option<DateTime<Utc>>,

    pub is_milestone: bool,

    /// Free-form comma/JSON tag string, opaque to the store
    pub tags: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub assignee_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub estimated_hours: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_milestone: bool,
    pub tags: Option<String>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// Field delta for updating a task
///
/// Double-Option fields distinguish "leave unchanged" (None, field
/// absent) from "set to null" (Some(None), field present as JSON null):
/// unassigning a task and detaching it from its parent both arrive as
/// explicit nulls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub parent_task_id: Option<Option<Uuid>>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_milestone: Option<bool>,
    pub tags: Option<String>,
}

/// Optional filters for task listings
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

impl Task {
    /// Creates a new task
    ///
    /// When a parent is given it must exist in the same project; a task
    /// created fresh can never introduce a cycle.
    pub async fn create(
        conn: &mut PgConnection,
        creator_id: Uuid,
        data: CreateTask,
    ) -> StoreResult<Self> {
        if let Some(parent_id) = data.parent_task_id {
            let parent = Self::find_by_id(&mut *conn, parent_id)
                .await?
                .ok_or(StoreError::NotFound("parent task"))?;
            if parent.project_id != data.project_id {
                return Err(StoreError::InvalidState(
                    "parent task belongs to a different project".to_string(),
                ));
            }
        }

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, project_id,
                               assignee_id, creator_id, parent_task_id, estimated_hours,
                               start_date, due_date, is_milestone, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, title, description, status, priority, project_id, assignee_id,
                      creator_id, parent_task_id, estimated_hours, actual_hours,
                      start_date, due_date, completed_at, is_milestone, tags,
                      created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.project_id)
        .bind(data.assignee_id)
        .bind(creator_id)
        .bind(data.parent_task_id)
        .bind(data.estimated_hours)
        .bind(data.start_date)
        .bind(data.due_date)
        .bind(data.is_milestone)
        .bind(data.tags)
        .fetch_one(&mut *conn)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, project_id, assignee_id,
                   creator_id, parent_task_id, estimated_hours, actual_hours,
                   start_date, due_date, completed_at, is_milestone, tags,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists tasks in one project with optional filters, newest first
    pub async fn list_by_project<'e, E>(
        executor: E,
        project_id: Uuid,
        filter: TaskFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, project_id, assignee_id,
                   creator_id, parent_task_id, estimated_hours, actual_hours,
                   start_date, due_date, completed_at, is_milestone, tags,
                   created_at, updated_at
            FROM tasks
            WHERE project_id = $1
              AND ($2::uuid IS NULL OR assignee_id = $2)
              AND ($3::task_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(project_id)
        .bind(filter.assignee_id)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks across a set of projects (the caller's accessible scope)
    pub async fn list_in_projects<'e, E>(
        executor: E,
        project_ids: &[Uuid],
        filter: TaskFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, project_id, assignee_id,
                   creator_id, parent_task_id, estimated_hours, actual_hours,
                   start_date, due_date, completed_at, is_milestone, tags,
                   created_at, updated_at
            FROM tasks
            WHERE project_id = ANY($1)
              AND ($2::uuid IS NULL OR assignee_id = $2)
              AND ($3::task_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(project_ids)
        .bind(filter.assignee_id)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Lists direct subtasks of a task, oldest first
    pub async fn list_subtasks<'e, E>(executor: E, parent_id: Uuid) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, project_id, assignee_id,
                   creator_id, parent_task_id, estimated_hours, actual_hours,
                   start_date, due_date, completed_at, is_milestone, tags,
                   created_at, updated_at
            FROM tasks
            WHERE parent_task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// IDs of every task in a project
    ///
    /// Used when a project is deleted to clear the tasks' search
    /// documents after the cascade has already removed the rows.
    pub async fn ids_by_project<'e, E>(executor: E, project_id: Uuid) -> StoreResult<Vec<Uuid>>
    where
        E: PgExecutor<'e>,
    {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(executor)
            .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Applies a field delta to a task row
    ///
    /// Parent reassignment is validated with a walk-to-root cycle check
    /// before the UPDATE is built. A status change to `done` sets
    /// `completed_at` only if it is still NULL.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        data: UpdateTask,
    ) -> StoreResult<Self> {
        if let Some(Some(parent_id)) = data.parent_task_id {
            Self::check_parent_cycle(&mut *conn, id, parent_id).await?;
        }

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }
        if data.parent_task_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", parent_task_id = ${}", bind_count));
        }
        if data.estimated_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", estimated_hours = ${}", bind_count));
        }
        if data.actual_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", actual_hours = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.is_milestone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_milestone = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }

        // First transition into done stamps the completion time; later
        // writes keep the original value.
        if data.status == Some(TaskStatus::Done) {
            query.push_str(", completed_at = COALESCE(completed_at, NOW())");
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, project_id, \
             assignee_id, creator_id, parent_task_id, estimated_hours, actual_hours, \
             start_date, due_date, completed_at, is_milestone, tags, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(parent_task_id) = data.parent_task_id {
            q = q.bind(parent_task_id);
        }
        if let Some(estimated_hours) = data.estimated_hours {
            q = q.bind(estimated_hours);
        }
        if let Some(actual_hours) = data.actual_hours {
            q = q.bind(actual_hours);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(is_milestone) = data.is_milestone {
            q = q.bind(is_milestone);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }

        let task = q
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(StoreError::NotFound("task"))?;

        Ok(task)
    }

    /// Deletes a task; comments and attachments cascade
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> StoreResult<bool>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(StoreError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Rejects a parent assignment that would create a cycle
    ///
    /// Walks from the candidate parent up to the root. If the walk meets
    /// the task being re-parented, the assignment would close a loop.
    async fn check_parent_cycle(
        conn: &mut PgConnection,
        task_id: Uuid,
        new_parent_id: Uuid,
    ) -> StoreResult<()> {
        if new_parent_id == task_id {
            return Err(StoreError::InvalidState(
                "task cannot be its own parent".to_string(),
            ));
        }

        let mut cursor = Some(new_parent_id);
        while let Some(current) = cursor {
            let parent: Option<(Option<Uuid>,)> =
                sqlx::query_as("SELECT parent_task_id FROM tasks WHERE id = $1")
                    .bind(current)
                    .fetch_optional(&mut *conn)
                    .await?;

            let Some((next,)) = parent else {
                return Err(StoreError::NotFound("parent task"));
            };

            if next == Some(task_id) {
                return Err(StoreError::InvalidState(
                    "parent assignment would create a cycle".to_string(),
                ));
            }

            cursor = next;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::InReview.as_str(), "in_review");
        assert_eq!(TaskStatus::Done.as_str(), "done");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_task_status_is_open() {
        assert!(TaskStatus::Todo.is_open());
        assert!(TaskStatus::InProgress.is_open());
        assert!(TaskStatus::InReview.is_open());
        assert!(!TaskStatus::Done.is_open());
        assert!(!TaskStatus::Cancelled.is_open());
    }

    #[test]
    fn test_create_task_defaults() {
        let data: CreateTask = serde_json::from_str(
            r#"{"project_id": "550e8400-e29b-41d4-a716-446655440000", "title": "Survey site"}"#,
        )
        .unwrap();
        assert_eq!(data.status, TaskStatus::Todo);
        assert_eq!(data.priority, Priority::Medium);
        assert!(!data.is_milestone);
    }

    #[test]
    fn test_update_task_default_changes_nothing() {
        let delta = UpdateTask::default();
        assert!(delta.title.is_none());
        assert!(delta.status.is_none());
        assert!(delta.parent_task_id.is_none());
    }

    #[test]
    fn test_update_task_absent_field_is_unchanged() {
        let delta: UpdateTask = serde_json::from_str("{}").unwrap();
        assert_eq!(delta.assignee_id, None);
        assert_eq!(delta.parent_task_id, None);
    }

    #[test]
    fn test_update_task_explicit_null_clears_field() {
        let delta: UpdateTask =
            serde_json::from_str(r#"{"assignee_id": null, "parent_task_id": null}"#).unwrap();
        assert_eq!(delta.assignee_id, Some(None));
        assert_eq!(delta.parent_task_id, Some(None));
    }

    #[test]
    fn test_update_task_explicit_value_sets_field() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        let delta: UpdateTask =
            serde_json::from_str(&format!(r#"{{"assignee_id": "{}"}}"#, id)).unwrap();
        assert_eq!(delta.assignee_id, Some(Some(id.parse().unwrap())));
        assert_eq!(delta.parent_task_id, None);
    }
}
