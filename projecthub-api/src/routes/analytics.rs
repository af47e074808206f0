/// Analytics endpoints
///
/// # Endpoints
///
/// - `GET /v1/analytics/dashboard` - Cross-project summary
/// - `GET /v1/analytics/projects/:id` - Per-project statistics
/// - `GET /v1/analytics/trends?days=&project_id=` - Creation/completion trends
/// - `GET /v1/analytics/workload` - The caller's assigned work
/// - `GET /v1/analytics/performance?days=` - The caller's completion metrics
///
/// Handlers are thin: the scoping (only projects the caller can read) and
/// the aggregation live in the shared analytics module.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use projecthub_shared::analytics::{
    self, DashboardSummary, PerformanceReport, ProjectStats, TrendSeries, Workload,
};
use projecthub_shared::models::user::User;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiResult;

/// Time-window query parameters
#[derive(Debug, Deserialize)]
pub struct WindowParams {
    #[serde(default = "default_days")]
    pub days: i64,

    pub project_id: Option<Uuid>,
}

fn default_days() -> i64 {
    30
}

/// Summary counts across every project the caller can read
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<DashboardSummary>> {
    let summary = analytics::dashboard(&state.db, &user).await?;
    Ok(Json(summary))
}

/// Detailed statistics for one project
pub async fn project_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectStats>> {
    let stats = analytics::project_stats(&state.db, &user, id).await?;
    Ok(Json(stats))
}

/// Daily task creation and completion counts over a window
///
/// A window outside 1-365 days fails with `422 invalid_state`.
pub async fn task_trends(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<TrendSeries>> {
    let trends = analytics::task_trends(&state.db, &user, params.project_id, params.days).await?;
    Ok(Json(trends))
}

/// The caller's current assigned workload
pub async fn workload(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<Workload>> {
    let workload = analytics::workload(&state.db, &user).await?;
    Ok(Json(workload))
}

/// The caller's completion metrics over a window
pub async fn performance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<PerformanceReport>> {
    let report = analytics::performance(&state.db, &user, params.days).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_to_thirty_days() {
        let params: WindowParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.days, 30);
        assert!(params.project_id.is_none());
    }
}
