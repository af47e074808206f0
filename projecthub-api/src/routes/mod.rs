/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check
/// - `auth`: register, login, refresh, current user
/// - `users`: user account management
/// - `projects`: projects, members, project-scoped search
/// - `tasks`: tasks, subtasks, comments, attachments, similarity
/// - `analytics`: dashboards, trends, workload, performance

pub mod analytics;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
