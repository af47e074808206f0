/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use projecthub_api::{app::{build_router, AppState}, config::Config};
/// use projecthub_shared::search;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let search = search::connect(&config.search.to_search_config()).await;
/// let state = AppState::new(pool, search, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use projecthub_shared::auth::jwt;
use projecthub_shared::models::user::User;
use projecthub_shared::search::SearchSync;
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::error::ApiError;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; the search handle and
/// config are Arc-backed so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Search index handle, constructed once at startup
    pub search: SearchSync,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, search: SearchSync, config: Config) -> Self {
        Self {
            db,
            search,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// # Layout
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /v1/                             # versioned API
///     ├── /auth/                       # register/login/refresh public, /me authenticated
///     ├── /users/                      # authenticated
///     ├── /projects/                   # authenticated; per-project access checks inside
///     ├── /tasks/                      # authenticated
///     └── /analytics/                  # authenticated
/// ```
///
/// Middleware, bottom to top: request tracing, CORS, then per-group JWT
/// authentication.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no token yet.
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let auth_private = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::deactivate_user),
        )
        .route("/:id/activate", post(routes::users::activate_user));

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route(
            "/:id/members/:user_id",
            put(routes::projects::update_member_role).delete(routes::projects::remove_member),
        )
        .route("/:id/search", get(routes::projects::search_documents));

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task).get(routes::tasks::list_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/subtasks", get(routes::tasks::list_subtasks))
        .route("/:id/similar", get(routes::tasks::find_similar))
        .route(
            "/:id/comments",
            get(routes::tasks::list_comments).post(routes::tasks::add_comment),
        )
        .route(
            "/comments/:comment_id",
            put(routes::tasks::update_comment).delete(routes::tasks::delete_comment),
        )
        .route(
            "/:id/attachments",
            get(routes::tasks::list_attachments).post(routes::tasks::add_attachment),
        )
        .route(
            "/attachments/:attachment_id",
            axum::routing::delete(routes::tasks::delete_attachment),
        );

    let analytics_routes = Router::new()
        .route("/dashboard", get(routes::analytics::dashboard))
        .route("/projects/:id", get(routes::analytics::project_stats))
        .route("/trends", get(routes::analytics::task_trends))
        .route("/workload", get(routes::analytics::workload))
        .route("/performance", get(routes::analytics::performance));

    // Everything except auth/health requires a valid access token.
    let authenticated = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/analytics", analytics_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .merge(authenticated);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Rejects deactivated accounts with 403; their token is still valid,
/// they just may not act
fn ensure_active(user: &User) -> Result<(), ApiError> {
    if user.is_active {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Account is deactivated".to_string()))
    }
}

/// JWT authentication middleware
///
/// Validates the bearer token (401 when bad or missing), loads the user
/// row, and rejects deactivated accounts with 403. The full [`User`]
/// lands in request extensions so handlers can do access checks without
/// another lookup.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    ensure_active(&user)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_user(is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "worker@example.com".to_string(),
            username: "worker".to_string(),
            full_name: "Worker".to_string(),
            password_hash: "$argon2id$test".to_string(),
            is_active,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_account_passes() {
        assert!(ensure_active(&make_user(true)).is_ok());
    }

    #[test]
    fn test_deactivated_account_is_forbidden() {
        let err = ensure_active(&make_user(false)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
