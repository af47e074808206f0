/// Project endpoints
///
/// # Endpoints
///
/// - `POST /v1/projects` - Create a project (caller becomes owner)
/// - `GET /v1/projects` - List the caller's projects
/// - `GET /v1/projects/:id` - Project detail with task counts
/// - `PUT /v1/projects/:id` - Update project metadata
/// - `DELETE /v1/projects/:id` - Delete a project (owner only)
/// - `GET /v1/projects/:id/members` - List members
/// - `POST /v1/projects/:id/members` - Add a member
/// - `PUT /v1/projects/:id/members/:user_id` - Change a member's role
/// - `DELETE /v1/projects/:id/members/:user_id` - Remove a member
/// - `GET /v1/projects/:id/search` - Semantic search within the project
///
/// Access checks run inside the same transaction as the write they guard.
/// Search index updates happen after commit and never fail the request.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use projecthub_shared::access;
use projecthub_shared::models::membership::{CreateMembership, MemberRole, Membership};
use projecthub_shared::models::project::{
    CreateProject, Project, TaskCounts, UpdateProject,
};
use projecthub_shared::models::task::Task;
use projecthub_shared::models::user::User;
use projecthub_shared::search::SearchHit;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::users::Pagination;

/// Project with its task counts, as returned by list and detail endpoints
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub tasks_count: i64,
    pub completed_tasks_count: i64,
}

impl ProjectResponse {
    fn new(project: Project, counts: TaskCounts) -> Self {
        ProjectResponse {
            project,
            tasks_count: counts.tasks_count,
            completed_tasks_count: counts.completed_tasks_count,
        }
    }
}

/// Creates a project; the caller becomes its owner
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(data): Json<CreateProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    if data.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let project = Project::create(&mut tx, user.id, data).await?;
    tx.commit().await?;

    state.search.sync_project(&project).await;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Lists the caller's projects with task counts, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects =
        Project::list_for_member(&state.db, user.id, page.limit(), page.offset()).await?;

    let mut responses = Vec::with_capacity(projects.len());
    for project in projects {
        let counts = Project::task_counts(&state.db, project.id).await?;
        responses.push(ProjectResponse::new(project, counts));
    }

    Ok(Json(responses))
}

/// Project detail: task counts plus the member list
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub tasks_count: i64,
    pub completed_tasks_count: i64,
    pub members: Vec<Membership>,
}

/// Project detail with task counts and members
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("project not found".to_string()))?;

    access::require_access(&state.db, &user, id).await?;

    let counts = Project::task_counts(&state.db, id).await?;
    let members = Membership::list_by_project(&state.db, id).await?;

    Ok(Json(ProjectDetail {
        project,
        tasks_count: counts.tasks_count,
        completed_tasks_count: counts.completed_tasks_count,
        members,
    }))
}

/// Updates project metadata (owner or admin role)
pub async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateProject>,
) -> ApiResult<Json<Project>> {
    let mut tx = state.db.begin().await?;
    access::require_manage(&mut *tx, &user, id).await?;
    let project = Project::update(&mut *tx, id, data).await?;
    tx.commit().await?;

    state.search.sync_project(&project).await;

    Ok(Json(project))
}

/// Deletes a project and everything in it (owner only)
///
/// Task rows cascade in the database; their search documents are removed
/// afterwards, so the task IDs are collected before the DELETE runs.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;

    Project::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("project not found".to_string()))?;

    access::require_role(&mut *tx, &user, id, MemberRole::Owner).await?;

    let task_ids = Task::ids_by_project(&mut *tx, id).await?;
    Project::delete(&mut *tx, id).await?;
    tx.commit().await?;

    for task_id in task_ids {
        state.search.remove_task(task_id).await;
    }
    state.search.remove_project(id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a project's members, oldest first
pub async fn list_members(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Membership>>> {
    access::require_access(&state.db, &user, id).await?;

    let members = Membership::list_by_project(&state.db, id).await?;
    Ok(Json(members))
}

/// Adds a user to a project (owner or admin role)
pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateMembership>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let mut tx = state.db.begin().await?;

    access::require_manage(&mut *tx, &user, id).await?;

    User::find_by_id(&mut *tx, data.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    let membership = Membership::create(&mut *tx, id, data).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// Role change request body
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: MemberRole,
}

/// Changes a member's role (owner or admin role)
///
/// Demoting the last owner fails with `422 invalid_state`.
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let mut tx = state.db.begin().await?;
    access::require_manage(&mut *tx, &user, id).await?;
    let membership = Membership::update_role(&mut tx, id, member_id, req.role).await?;
    tx.commit().await?;

    Ok(Json(membership))
}

/// Removes a member from a project
///
/// Managers can remove anyone; a member can always remove themselves.
/// Removing the last owner fails with `422 invalid_state` either way.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;

    if user.id != member_id {
        access::require_manage(&mut *tx, &user, id).await?;
    }

    Membership::remove(&mut tx, id, member_id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,

    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    10
}

/// Semantic search over a project's documents
///
/// Results come from the search index, which is best-effort: when the
/// index is unavailable this returns an empty list, never an error.
pub async fn search_documents(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    if params.q.trim().is_empty() {
        return Err(ApiError::BadRequest("Query parameter 'q' is required".to_string()));
    }

    access::require_access(&state.db, &user, id).await?;

    let limit = params.limit.clamp(1, 50);
    let hits = state.search.search_project_documents(id, &params.q, limit).await;

    Ok(Json(hits))
}
