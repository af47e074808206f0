/// Schema migration runner
///
/// Migrations live in the `migrations/` directory of this crate and are
/// embedded into the binary with `sqlx::migrate!`, so deployments carry
/// their schema with them.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applies all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("database migrations complete");
            Ok(())
        }
        Err(e) => {
            warn!("migration failed: {}", e);
            Err(e)
        }
    }
}

/// Creates the database if it does not exist
///
/// Convenience for development and tests; production databases are
/// provisioned out of band.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("database already exists");
    }

    Ok(())
}

/// Drops the database, data and all
///
/// Test-harness helper. Never point this at a production URL.
pub async fn drop_database(database_url: &str) -> Result<(), sqlx::Error> {
    warn!("dropping database: {}", database_url);

    if Postgres::database_exists(database_url).await? {
        Postgres::drop_database(database_url).await?;
    }

    Ok(())
}
