/// Project model and database operations
///
/// A project is the unit of collaboration and access control. Its owner is
/// always also a member with role `owner`: `Project::create` inserts both
/// rows in the caller's transaction so the invariant holds from the first
/// commit. Deleting a project cascades to its tasks and their comments and
/// attachments via foreign keys.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM (
///     'planning', 'in_progress', 'on_hold', 'completed', 'cancelled'
/// );
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'planning',
///     priority priority NOT NULL DEFAULT 'medium',
///     owner_id UUID NOT NULL REFERENCES users(id),
///     progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
///     start_date TIMESTAMPTZ,
///     end_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::membership::MemberRole;
use super::Priority;
use crate::error::{StoreError, StoreResult};

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Planning,
        ProjectStatus::InProgress,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,

    /// Owning user; always mirrored by an owner-role membership row
    pub owner_id: Uuid,

    /// Completion percentage, 0-100
    pub progress: i32,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: ProjectStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn default_status() -> ProjectStatus {
    ProjectStatus::Planning
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// Field delta for updating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub progress: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Per-project task counts attached to list/detail responses
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct TaskCounts {
    pub tasks_count: i64,
    pub completed_tasks_count: i64,
}

impl Project {
    /// Creates a project and its owner membership in one transaction
    ///
    /// The caller supplies an open transaction connection; both inserts
    /// commit or roll back together, so a project never exists without a
    /// member holding the `owner` role.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use projecthub_shared::models::project::{CreateProject, Project};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, owner_id: Uuid, data: CreateProject) -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tx = pool.begin().await?;
    /// let project = Project::create(&mut tx, owner_id, data).await?;
    /// tx.commit().await?;
    /// println!("created project {}", project.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(
        conn: &mut PgConnection,
        owner_id: Uuid,
        data: CreateProject,
    ) -> StoreResult<Self> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, status, priority, owner_id,
                                  start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, status, priority, owner_id, progress,
                      start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(owner_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project.id)
        .bind(owner_id)
        .bind(MemberRole::Owner)
        .execute(&mut *conn)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, priority, owner_id, progress,
                   start_date, end_date, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Lists the projects a user is a member of, newest first
    pub async fn list_for_member<'e, E>(
        executor: E,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Self>>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.status, p.priority, p.owner_id,
                   p.progress, p.start_date, p.end_date, p.created_at, p.updated_at
            FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Applies a field delta to a project row
    pub async fn update<'e, E>(executor: E, id: Uuid, data: UpdateProject) -> StoreResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
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
        if data.progress.is_some() {
            bind_count += 1;
            query.push_str(&format!(", progress = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.end_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_date = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, description, status, priority, owner_id, \
             progress, start_date, end_date, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
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
        if let Some(progress) = data.progress {
            q = q.bind(progress);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }

        let project = q
            .fetch_optional(executor)
            .await?
            .ok_or(StoreError::NotFound("project"))?;

        Ok(project)
    }

    /// Deletes a project; tasks, comments, and attachments cascade
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> StoreResult<bool>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(StoreError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Total and completed task counts for one project
    pub async fn task_counts<'e, E>(executor: E, id: Uuid) -> StoreResult<TaskCounts>
    where
        E: PgExecutor<'e>,
    {
        let counts = sqlx::query_as::<_, TaskCounts>(
            r#"
            SELECT COUNT(*) AS tasks_count,
                   COUNT(*) FILTER (WHERE status = 'done') AS completed_tasks_count
            FROM tasks
            WHERE project_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_as_str() {
        assert_eq!(ProjectStatus::Planning.as_str(), "planning");
        assert_eq!(ProjectStatus::InProgress.as_str(), "in_progress");
        assert_eq!(ProjectStatus::OnHold.as_str(), "on_hold");
        assert_eq!(ProjectStatus::Completed.as_str(), "completed");
        assert_eq!(ProjectStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_create_project_defaults() {
        let data: CreateProject =
            serde_json::from_str(r#"{"name": "Bridge inspection"}"#).unwrap();
        assert_eq!(data.status, ProjectStatus::Planning);
        assert_eq!(data.priority, Priority::Medium);
        assert!(data.description.is_none());
    }

    #[test]
    fn test_project_status_serde_snake_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
    }
}
