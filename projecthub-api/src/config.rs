/// Configuration management for the API server
///
/// Loaded from environment variables (a `.env` file is honored in
/// development).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: *)
/// - `JWT_SECRET`: secret for JWT signing, at least 32 bytes (required)
/// - `SEARCH_URL`: base URL of the remote search index (optional; the
///   embedded index is used when unset)
/// - `SEARCH_COLLECTION`: collection name on the remote index
///   (default: projecthub)
/// - `SEARCH_TIMEOUT_SECONDS`: per-request index timeout (default: 5)

use std::env;
use std::time::Duration;

use projecthub_shared::search::SearchConfig;
use serde::{Deserialize, Serialize};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub search: SearchSettings,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; "*" enables permissive mode
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret; at least 32 bytes. Generate with
    /// `openssl rand -hex 32`.
    pub secret: String,
}

/// Search index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    pub url: Option<String>,
    pub collection: String,
    pub timeout_seconds: u64,
}

impl SearchSettings {
    /// Converts to the shared search configuration
    pub fn to_search_config(&self) -> SearchConfig {
        SearchConfig {
            url: self.url.clone(),
            collection: self.collection.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let search_url = env::var("SEARCH_URL").ok().filter(|s| !s.is_empty());
        let search_collection =
            env::var("SEARCH_COLLECTION").unwrap_or_else(|_| "projecthub".to_string());
        let search_timeout = env::var("SEARCH_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            search: SearchSettings {
                url: search_url,
                collection: search_collection,
                timeout_seconds: search_timeout,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            search: SearchSettings {
                url: None,
                collection: "projecthub".to_string(),
                timeout_seconds: 5,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_search_settings_conversion() {
        let search = test_config().search.to_search_config();
        assert!(search.url.is_none());
        assert_eq!(search.collection, "projecthub");
        assert_eq!(search.timeout, Duration::from_secs(5));
    }
}
