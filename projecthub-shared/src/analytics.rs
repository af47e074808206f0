/// Analytics engine
///
/// Derived metrics computed strictly from the relational store, scoped to
/// the projects the caller can access. Every operation takes the
/// authenticated user and resolves its scope through the access module
/// before aggregating; only the access check can fail with
/// `Forbidden`/`NotFound`, aggregation itself always succeeds on a valid
/// scope.
///
/// Rates are percentages (0–100); they guard the zero-denominator case
/// and report 0 instead of failing.
/// All time arithmetic uses a single UTC clock read per operation.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::access;
use crate::error::{StoreError, StoreResult};
use crate::models::membership::Membership;
use crate::models::project::Project;
use crate::models::task::TaskStatus;
use crate::models::user::User;
use crate::models::Priority;

/// Longest allowed trend/performance window, in days
pub const MAX_WINDOW_DAYS: i64 = 365;

/// Cross-project summary for the caller's dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_projects: i64,
    pub total_tasks: i64,
    pub my_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: f64,
    pub tasks_created_last_7_days: i64,
}

/// Per-member completion figures inside one project
#[derive(Debug, Clone, Serialize)]
pub struct MemberPerformance {
    pub user_id: Uuid,
    pub username: String,
    pub assigned_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: f64,
}

/// One day of activity in a timeline or trend series
#[derive(Debug, Clone, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Full statistics for one project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub project_id: Uuid,
    pub name: String,

    /// Task counts per status; every status appears, zero included
    pub tasks_by_status: BTreeMap<String, i64>,

    /// Task counts per priority; every priority appears, zero included
    pub tasks_by_priority: BTreeMap<String, i64>,

    pub member_count: i64,
    pub member_performance: Vec<MemberPerformance>,

    /// Daily task creation over the trailing 30 days; only days with
    /// activity appear
    pub creation_timeline: Vec<DayCount>,
}

/// Created/completed series over a caller-chosen window
#[derive(Debug, Clone, Serialize)]
pub struct TrendSeries {
    pub window_days: i64,
    pub created: Vec<DayCount>,
    pub completed: Vec<DayCount>,
}

/// The caller's current task load
#[derive(Debug, Clone, Serialize)]
pub struct Workload {
    pub tasks_by_status: BTreeMap<String, i64>,
    pub overdue_tasks: i64,
    pub upcoming_tasks: i64,

    /// Priority distribution of the caller's open tasks
    pub open_by_priority: BTreeMap<String, i64>,
}

/// The caller's completion metrics over a window
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub window_days: i64,
    pub completed_tasks: i64,
    pub avg_completion_hours: f64,
    pub on_time_rate: f64,
    pub tasks_per_day: f64,
}

/// Guarded percentage: 0 when the denominator is 0
fn rate(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Validates a caller-supplied window length
fn validate_window(days: i64) -> StoreResult<i64> {
    if (1..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(StoreError::InvalidState(format!(
            "window must be between 1 and {} days, got {}",
            MAX_WINDOW_DAYS, days
        )))
    }
}

/// Folds observed (key, count) rows into a map with every enum value present
fn zero_filled<'a, I>(keys: I, observed: Vec<(String, i64)>) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buckets: BTreeMap<String, i64> =
        keys.into_iter().map(|k| (k.to_string(), 0)).collect();
    for (key, count) in observed {
        buckets.insert(key, count);
    }
    buckets
}

/// Dashboard summary across the caller's accessible projects
pub async fn dashboard(pool: &PgPool, user: &User) -> StoreResult<DashboardSummary> {
    let now = Utc::now();
    let project_ids = access::accessible_project_ids(pool, user).await?;

    let (total_tasks, completed_tasks, my_tasks, recent_tasks): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'done'),
                   COUNT(*) FILTER (WHERE assignee_id = $2),
                   COUNT(*) FILTER (WHERE created_at >= $3)
            FROM tasks
            WHERE project_id = ANY($1)
            "#,
        )
        .bind(&project_ids)
        .bind(user.id)
        .bind(now - Duration::days(7))
        .fetch_one(pool)
        .await?;

    Ok(DashboardSummary {
        total_projects: project_ids.len() as i64,
        total_tasks,
        my_tasks,
        completed_tasks,
        completion_rate: rate(completed_tasks, total_tasks),
        tasks_created_last_7_days: recent_tasks,
    })
}

/// Statistics for one project; requires read access
pub async fn project_stats(
    pool: &PgPool,
    user: &User,
    project_id: Uuid,
) -> StoreResult<ProjectStats> {
    let now = Utc::now();

    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(StoreError::NotFound("project"))?;
    access::require_access(pool, user, project_id).await?;

    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status::text, COUNT(*) FROM tasks WHERE project_id = $1 GROUP BY status",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let by_priority: Vec<(String, i64)> = sqlx::query_as(
        "SELECT priority::text, COUNT(*) FROM tasks WHERE project_id = $1 GROUP BY priority",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let member_count = Membership::count_by_project(pool, project_id).await?;

    let performance_rows: Vec<(Uuid, String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT u.id, u.username,
               COUNT(t.id),
               COUNT(t.id) FILTER (WHERE t.status = 'done')
        FROM project_members pm
        JOIN users u ON u.id = pm.user_id
        LEFT JOIN tasks t ON t.assignee_id = u.id AND t.project_id = pm.project_id
        WHERE pm.project_id = $1
        GROUP BY u.id, u.username
        ORDER BY u.username
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let member_performance = performance_rows
        .into_iter()
        .map(|(user_id, username, assigned, completed)| MemberPerformance {
            user_id,
            username,
            assigned_tasks: assigned,
            completed_tasks: completed,
            completion_rate: rate(completed, assigned),
        })
        .collect();

    let timeline: Vec<(NaiveDate, i64)> = sqlx::query_as(
        r#"
        SELECT created_at::date AS day, COUNT(*)
        FROM tasks
        WHERE project_id = $1 AND created_at >= $2
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(project_id)
    .bind(now - Duration::days(30))
    .fetch_all(pool)
    .await?;

    Ok(ProjectStats {
        project_id,
        name: project.name,
        tasks_by_status: zero_filled(
            TaskStatus::ALL.iter().map(|s| s.as_str()),
            by_status,
        ),
        tasks_by_priority: zero_filled(
            Priority::ALL.iter().map(|p| p.as_str()),
            by_priority,
        ),
        member_count,
        member_performance,
        creation_timeline: timeline
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
    })
}

/// Daily created/completed counts over a window
///
/// Scoped to one project when `project_id` is given (requires read
/// access), otherwise to the union of the caller's accessible projects.
pub async fn task_trends(
    pool: &PgPool,
    user: &User,
    project_id: Option<Uuid>,
    days: i64,
) -> StoreResult<TrendSeries> {
    let days = validate_window(days)?;
    let now = Utc::now();
    let cutoff = now - Duration::days(days);

    let project_ids = match project_id {
        Some(id) => {
            Project::find_by_id(pool, id)
                .await?
                .ok_or(StoreError::NotFound("project"))?;
            access::require_access(pool, user, id).await?;
            vec![id]
        }
        None => access::accessible_project_ids(pool, user).await?,
    };

    let created: Vec<(NaiveDate, i64)> = sqlx::query_as(
        r#"
        SELECT created_at::date AS day, COUNT(*)
        FROM tasks
        WHERE project_id = ANY($1) AND created_at >= $2
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(&project_ids)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let completed: Vec<(NaiveDate, i64)> = sqlx::query_as(
        r#"
        SELECT completed_at::date AS day, COUNT(*)
        FROM tasks
        WHERE project_id = ANY($1) AND completed_at IS NOT NULL AND completed_at >= $2
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(&project_ids)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(TrendSeries {
        window_days: days,
        created: created
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
        completed: completed
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
    })
}

/// The caller's assigned-task load
pub async fn workload(pool: &PgPool, user: &User) -> StoreResult<Workload> {
    let now = Utc::now();

    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status::text, COUNT(*) FROM tasks WHERE assignee_id = $1 GROUP BY status",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    let (overdue, upcoming): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FILTER (WHERE due_date < $2),
               COUNT(*) FILTER (WHERE due_date >= $2 AND due_date <= $3)
        FROM tasks
        WHERE assignee_id = $1
          AND status NOT IN ('done', 'cancelled')
          AND due_date IS NOT NULL
        "#,
    )
    .bind(user.id)
    .bind(now)
    .bind(now + Duration::days(7))
    .fetch_one(pool)
    .await?;

    let open_by_priority: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT priority::text, COUNT(*)
        FROM tasks
        WHERE assignee_id = $1 AND status NOT IN ('done', 'cancelled')
        GROUP BY priority
        "#,
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    Ok(Workload {
        tasks_by_status: zero_filled(
            TaskStatus::ALL.iter().map(|s| s.as_str()),
            by_status,
        ),
        overdue_tasks: overdue,
        upcoming_tasks: upcoming,
        open_by_priority: zero_filled(
            Priority::ALL.iter().map(|p| p.as_str()),
            open_by_priority,
        ),
    })
}

/// The caller's completion metrics over a window
pub async fn performance(pool: &PgPool, user: &User, days: i64) -> StoreResult<PerformanceReport> {
    let days = validate_window(days)?;
    let now = Utc::now();
    let cutoff = now - Duration::days(days);

    let (completed, avg_hours, on_time): (i64, Option<f64>, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               AVG(EXTRACT(EPOCH FROM (completed_at - created_at)) / 3600.0)::float8,
               COUNT(*) FILTER (WHERE due_date IS NOT NULL AND completed_at <= due_date)
        FROM tasks
        WHERE assignee_id = $1 AND completed_at IS NOT NULL AND completed_at >= $2
        "#,
    )
    .bind(user.id)
    .bind(cutoff)
    .fetch_one(pool)
    .await?;

    Ok(PerformanceReport {
        window_days: days,
        completed_tasks: completed,
        avg_completion_hours: avg_hours.unwrap_or(0.0),
        on_time_rate: rate(on_time, completed),
        tasks_per_day: completed as f64 / days as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_guards_zero_denominator() {
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(0, 0), 0.0);
    }

    #[test]
    fn test_rate_is_a_percentage() {
        assert_eq!(rate(1, 1), 100.0);
        assert_eq!(rate(3, 4), 75.0);
        assert_eq!(rate(1, 2), 50.0);
    }

    #[test]
    fn test_validate_window_bounds() {
        assert!(validate_window(0).is_err());
        assert!(validate_window(-7).is_err());
        assert!(validate_window(366).is_err());

        assert_eq!(validate_window(1).unwrap(), 1);
        assert_eq!(validate_window(30).unwrap(), 30);
        assert_eq!(validate_window(365).unwrap(), 365);
    }

    #[test]
    fn test_validate_window_error_kind() {
        let err = validate_window(400).unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[test]
    fn test_zero_filled_includes_every_bucket() {
        let observed = vec![("done".to_string(), 3)];
        let buckets = zero_filled(TaskStatus::ALL.iter().map(|s| s.as_str()), observed);

        assert_eq!(buckets.len(), TaskStatus::ALL.len());
        assert_eq!(buckets["done"], 3);
        assert_eq!(buckets["todo"], 0);
        assert_eq!(buckets["in_review"], 0);
    }

    #[test]
    fn test_zero_filled_priorities() {
        let buckets = zero_filled(Priority::ALL.iter().map(|p| p.as_str()), Vec::new());
        assert_eq!(buckets.len(), 4);
        assert!(buckets.values().all(|c| *c == 0));
    }
}
