/// Task endpoints
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create a task (member role or above)
/// - `GET /v1/tasks` - List tasks across accessible projects
/// - `GET /v1/tasks/:id` - Get one task
/// - `PUT /v1/tasks/:id` - Update a task
/// - `DELETE /v1/tasks/:id` - Delete a task (creator, assignee, or manager)
/// - `GET /v1/tasks/:id/subtasks` - Direct subtasks
/// - `GET /v1/tasks/:id/similar` - Similar tasks from the search index
/// - `GET /v1/tasks/:id/comments` / `POST` - Comments
/// - `PUT /v1/tasks/comments/:comment_id` / `DELETE` - Edit/remove comments
/// - `GET /v1/tasks/:id/attachments` / `POST` - Attachment metadata
/// - `DELETE /v1/tasks/attachments/:attachment_id` - Remove an attachment
///
/// Every handler resolves the task first, then checks access against the
/// task's project. Viewers can read everything here but write nothing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use projecthub_shared::access;
use projecthub_shared::models::attachment::{Attachment, CreateAttachment};
use projecthub_shared::models::comment::{Comment, CreateComment};
use projecthub_shared::models::membership::MemberRole;
use projecthub_shared::models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use projecthub_shared::models::user::User;
use projecthub_shared::search::SearchHit;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Task listing query parameters
#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,

    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl TaskListParams {
    fn filter(&self) -> TaskFilter {
        TaskFilter {
            assignee_id: self.assignee_id,
            status: self.status,
        }
    }

    fn limit(&self) -> i64 {
        self.limit.clamp(1, 200)
    }

    fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

/// Loads a task and verifies the caller can read its project
async fn load_task(state: &AppState, user: &User, id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    access::require_access(&state.db, user, task.project_id).await?;

    Ok(task)
}

/// Creates a task (member role or above; viewers are read-only)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(data): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    if data.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }

    let mut tx = state.db.begin().await?;
    access::require_role(&mut *tx, &user, data.project_id, MemberRole::Member).await?;
    let task = Task::create(&mut tx, user.id, data).await?;
    tx.commit().await?;

    state.search.sync_task(&task).await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Lists tasks, newest first
///
/// With `?project_id=` the listing covers that project (access required);
/// without it, every project the caller can read.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = match params.project_id {
        Some(project_id) => {
            access::require_access(&state.db, &user, project_id).await?;
            Task::list_by_project(
                &state.db,
                project_id,
                params.filter(),
                params.limit(),
                params.offset(),
            )
            .await?
        }
        None => {
            let project_ids = access::accessible_project_ids(&state.db, &user).await?;
            Task::list_in_projects(
                &state.db,
                &project_ids,
                params.filter(),
                params.limit(),
                params.offset(),
            )
            .await?
        }
    };

    Ok(Json(tasks))
}

/// Task detail with its subtasks, comments, and attachments
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Task>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}

/// Gets one task with its subtasks, comments, and attachments
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    let task = load_task(&state, &user, id).await?;

    let subtasks = Task::list_subtasks(&state.db, id).await?;
    let comments = Comment::list_by_task(&state.db, id).await?;
    let attachments = Attachment::list_by_task(&state.db, id).await?;

    Ok(Json(TaskDetail {
        task,
        subtasks,
        comments,
        attachments,
    }))
}

/// Updates a task (member role or above)
///
/// Moving a task under one of its own descendants fails with
/// `422 invalid_state`.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let mut tx = state.db.begin().await?;

    let existing = Task::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    access::require_role(&mut *tx, &user, existing.project_id, MemberRole::Member).await?;

    let task = Task::update(&mut tx, id, data).await?;
    tx.commit().await?;

    state.search.sync_task(&task).await;

    Ok(Json(task))
}

/// Deletes a task; comments and attachments cascade, subtasks survive
/// with their parent cleared
///
/// Allowed for the task's creator, its assignee, and project managers.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;

    let task = Task::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

    access::require_access(&mut *tx, &user, task.project_id).await?;

    let is_creator_or_assignee = task.creator_id == user.id || task.assignee_id == Some(user.id);
    if !is_creator_or_assignee && !access::can_manage(&mut *tx, &user, task.project_id).await? {
        return Err(ApiError::Forbidden(
            "only the task creator, its assignee, or a project manager can delete a task"
                .to_string(),
        ));
    }

    Task::delete(&mut *tx, id).await?;
    tx.commit().await?;

    // Subtasks stay behind as top-level tasks, so only this task's
    // document leaves the index.
    state.search.remove_task(id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a task's direct subtasks, oldest first
pub async fn list_subtasks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    load_task(&state, &user, id).await?;

    let subtasks = Task::list_subtasks(&state.db, id).await?;
    Ok(Json(subtasks))
}

/// Similar-tasks query parameters
#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    #[serde(default = "default_similar_limit")]
    pub limit: usize,
}

fn default_similar_limit() -> usize {
    5
}

/// Tasks most similar to this one, from the search index
///
/// Best-effort: an unavailable index yields an empty list, not an error.
pub async fn find_similar(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(params): Query<SimilarParams>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let task = load_task(&state, &user, id).await?;

    let limit = params.limit.clamp(1, 20);
    let hits = state.search.find_similar_tasks(&task, limit).await;

    Ok(Json(hits))
}

/// Lists a task's comments, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    load_task(&state, &user, id).await?;

    let comments = Comment::list_by_task(&state.db, id).await?;
    Ok(Json(comments))
}

/// Posts a comment on a task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    if data.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment content is required".to_string()));
    }

    load_task(&state, &user, id).await?;

    let comment = Comment::create(&state.db, id, user.id, data).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Comment edit request body
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Edits a comment (author only)
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment content is required".to_string()));
    }

    let comment = Comment::find_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".to_string()))?;

    if comment.user_id != user.id {
        return Err(ApiError::Forbidden(
            "only the comment author can edit it".to_string(),
        ));
    }

    let comment = Comment::update_content(&state.db, comment_id, req.content).await?;
    Ok(Json(comment))
}

/// Deletes a comment (author or project manager)
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".to_string()))?;

    if comment.user_id != user.id {
        let task = Task::find_by_id(&state.db, comment.task_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

        if !access::can_manage(&state.db, &user, task.project_id).await? {
            return Err(ApiError::Forbidden(
                "only the comment author or a project manager can delete it".to_string(),
            ));
        }
    }

    Comment::delete(&state.db, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists a task's attachment metadata, oldest first
pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Attachment>>> {
    load_task(&state, &user, id).await?;

    let attachments = Attachment::list_by_task(&state.db, id).await?;
    Ok(Json(attachments))
}

/// Records attachment metadata for a task
///
/// Only the metadata row is stored; file bytes live wherever `file_path`
/// points and are not handled here.
pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateAttachment>,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    if data.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("Attachment filename is required".to_string()));
    }

    load_task(&state, &user, id).await?;

    let attachment = Attachment::create(&state.db, id, user.id, data).await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

/// Deletes an attachment record (uploader or project manager)
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(attachment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let attachment = Attachment::find_by_id(&state.db, attachment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("attachment not found".to_string()))?;

    if attachment.user_id != user.id {
        let task = Task::find_by_id(&state.db, attachment.task_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("task not found".to_string()))?;

        if !access::can_manage(&state.db, &user, task.project_id).await? {
            return Err(ApiError::Forbidden(
                "only the uploader or a project manager can delete an attachment".to_string(),
            ));
        }
    }

    Attachment::delete(&state.db, attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_list_params_defaults() {
        let params: TaskListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.limit(), 50);
        assert_eq!(params.offset(), 0);
        assert!(params.project_id.is_none());
        assert!(params.filter().status.is_none());
    }

    #[test]
    fn test_task_list_params_status_filter() {
        let params: TaskListParams =
            serde_json::from_str(r#"{"status": "in_progress", "limit": 500}"#).unwrap();
        assert_eq!(params.filter().status, Some(TaskStatus::InProgress));
        assert_eq!(params.limit(), 200);
    }
}
