//! # ProjectHub API Server
//!
//! Axum server exposing project/task management, membership-scoped
//! access, best-effort semantic search, and analytics.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p projecthub-api
//! ```

use projecthub_api::{
    app::{build_router, AppState},
    config::Config,
};
use projecthub_shared::db::{migrations, pool};
use projecthub_shared::search;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projecthub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "ProjectHub API server v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    // Falls back to the embedded index when the remote one is down; the
    // server starts either way.
    let search = search::connect(&config.search.to_search_config()).await;
    tracing::info!(index = search.index_name(), "search index ready");

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), search, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutdown signal received");
}
