/// Semantic search index
///
/// A best-effort side index of project and task text, queryable by
/// free-text similarity and filtered by structured metadata. The
/// relational store is the system of record; this index is a cache that
/// may lag or miss entries, and nothing in the system depends on it for
/// correctness.
///
/// Construction happens once at startup via [`connect`]: if a remote
/// index is configured and reachable it is used, otherwise the service
/// falls back to the in-process [`EmbeddedIndex`] and keeps running.

pub mod embedded;
pub mod embedding;
pub mod index;
pub mod remote;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

pub use embedded::EmbeddedIndex;
pub use index::{DocKind, DocMetadata, Document, IndexError, MetadataFilter, SearchHit, VectorIndex};
pub use remote::RemoteIndex;
pub use sync::SearchSync;

/// Search index configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL of the remote index; None selects the embedded fallback
    pub url: Option<String>,

    /// Collection name on the remote index
    pub collection: String,

    /// Per-request timeout for remote calls
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            url: None,
            collection: "projecthub".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Builds the process-wide index handle
///
/// Never fails: a missing or unreachable remote index downgrades to the
/// embedded one with a WARN, so the service starts either way.
pub async fn connect(config: &SearchConfig) -> SearchSync {
    let index: Arc<dyn VectorIndex> = match &config.url {
        Some(url) => {
            match RemoteIndex::connect(url, &config.collection, config.timeout).await {
                Ok(remote) => {
                    tracing::info!(url = %url, collection = %config.collection, "connected to remote search index");
                    Arc::new(remote)
                }
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        "remote search index unavailable, falling back to embedded index"
                    );
                    Arc::new(EmbeddedIndex::new())
                }
            }
        }
        None => {
            tracing::info!("no remote search index configured, using embedded index");
            Arc::new(EmbeddedIndex::new())
        }
    };

    SearchSync::new(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_url_uses_embedded() {
        let sync = connect(&SearchConfig::default()).await;
        assert_eq!(sync.index_name(), "embedded");
    }

    #[tokio::test]
    async fn test_connect_with_unreachable_url_falls_back() {
        let config = SearchConfig {
            url: Some("http://127.0.0.1:1".to_string()),
            collection: "projecthub".to_string(),
            timeout: Duration::from_millis(200),
        };

        let sync = connect(&config).await;
        assert_eq!(sync.index_name(), "embedded");
    }
}
