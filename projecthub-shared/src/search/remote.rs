/// Remote vector index client
///
/// Talks to a Chroma-compatible HTTP service. Embeddings are computed
/// client-side (see [`embedding`](super::embedding)) so the server needs
/// no embedding function configured. Every request carries the client's
/// bounded timeout; a slow index degrades to "unavailable" instead of
/// stalling callers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::embedding::embed;
use super::index::{DocKind, DocMetadata, Document, IndexError, MetadataFilter, SearchHit, VectorIndex};

/// HTTP client for a remote Chroma-compatible index
pub struct RemoteIndex {
    client: reqwest::Client,
    base_url: String,
    collection_id: String,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    documents: Option<Vec<Vec<Option<String>>>>,
    metadatas: Option<Vec<Vec<Option<serde_json::Value>>>>,
    distances: Option<Vec<Vec<f32>>>,
}

impl RemoteIndex {
    /// Connects to the remote index and resolves the collection
    ///
    /// Verifies the service is reachable, then gets or creates the named
    /// collection. Any failure here means the caller should fall back to
    /// the embedded index.
    pub async fn connect(
        url: &str,
        collection: &str,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IndexError::Http)?;

        let base_url = url.trim_end_matches('/').to_string();

        let heartbeat = client
            .get(format!("{}/api/v1/heartbeat", base_url))
            .send()
            .await?;
        if !heartbeat.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "heartbeat returned {}",
                heartbeat.status()
            )));
        }

        let response = client
            .post(format!("{}/api/v1/collections", base_url))
            .json(&json!({
                "name": collection,
                "get_or_create": true,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "collection setup returned {}",
                response.status()
            )));
        }

        let collection: CollectionResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Protocol(e.to_string()))?;

        Ok(RemoteIndex {
            client,
            base_url,
            collection_id: collection.id,
        })
    }

    fn collection_url(&self, op: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{}",
            self.base_url, self.collection_id, op
        )
    }

    fn where_clause(filter: &MetadataFilter) -> serde_json::Value {
        match filter.kind {
            Some(kind) => json!({
                "$and": [
                    {"project_id": filter.project_id.to_string()},
                    {"kind": kind.as_str()},
                ]
            }),
            None => json!({"project_id": filter.project_id.to_string()}),
        }
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn upsert(&self, doc: Document) -> Result<(), IndexError> {
        let embedding = embed(&doc.content);

        let response = self
            .client
            .post(self.collection_url("upsert"))
            .json(&json!({
                "ids": [doc.id],
                "embeddings": [embedding],
                "documents": [doc.content],
                "metadatas": [{
                    "kind": doc.metadata.kind.as_str(),
                    "project_id": doc.metadata.project_id.to_string(),
                }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "upsert returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn remove(&self, doc_id: &str) -> Result<(), IndexError> {
        let response = self
            .client
            .post(self.collection_url("delete"))
            .json(&json!({ "ids": [doc_id] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "delete returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        filter: MetadataFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let embedding = embed(text);

        let response = self
            .client
            .post(self.collection_url("query"))
            .json(&json!({
                "query_embeddings": [embedding],
                "n_results": limit,
                "where": Self::where_clause(&filter),
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::Unavailable(format!(
                "query returned {}",
                response.status()
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Protocol(e.to_string()))?;

        // Single query embedding: every result list has one inner vec.
        let ids = body.ids.into_iter().next().unwrap_or_default();
        let documents = body
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = body
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default();
        let distances = body
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        let mut hits = Vec::with_capacity(ids.len());
        for (i, doc_id) in ids.into_iter().enumerate() {
            let metadata = metadatas
                .get(i)
                .and_then(|m| m.as_ref())
                .and_then(parse_metadata)
                .ok_or_else(|| {
                    IndexError::Protocol(format!("missing metadata for {}", doc_id))
                })?;

            hits.push(SearchHit {
                doc_id,
                content: documents
                    .get(i)
                    .and_then(|d| d.clone())
                    .unwrap_or_default(),
                metadata,
                distance: distances.get(i).copied().unwrap_or(1.0),
            });
        }

        Ok(hits)
    }
}

fn parse_metadata(value: &serde_json::Value) -> Option<DocMetadata> {
    let kind = match value.get("kind")?.as_str()? {
        "project" => DocKind::Project,
        "task" => DocKind::Task,
        _ => return None,
    };
    let project_id = Uuid::parse_str(value.get("project_id")?.as_str()?).ok()?;

    Some(DocMetadata { kind, project_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_project_only() {
        let project_id = Uuid::new_v4();
        let filter = MetadataFilter {
            kind: None,
            project_id,
        };

        let clause = RemoteIndex::where_clause(&filter);
        assert_eq!(clause["project_id"], project_id.to_string());
    }

    #[test]
    fn test_where_clause_with_kind() {
        let project_id = Uuid::new_v4();
        let filter = MetadataFilter {
            kind: Some(DocKind::Task),
            project_id,
        };

        let clause = RemoteIndex::where_clause(&filter);
        let and = clause["$and"].as_array().unwrap();
        assert_eq!(and[0]["project_id"], project_id.to_string());
        assert_eq!(and[1]["kind"], "task");
    }

    #[test]
    fn test_parse_metadata() {
        let project_id = Uuid::new_v4();
        let value = json!({"kind": "task", "project_id": project_id.to_string()});

        let metadata = parse_metadata(&value).unwrap();
        assert_eq!(metadata.kind, DocKind::Task);
        assert_eq!(metadata.project_id, project_id);
    }

    #[test]
    fn test_parse_metadata_rejects_unknown_kind() {
        let value = json!({"kind": "comment", "project_id": Uuid::new_v4().to_string()});
        assert!(parse_metadata(&value).is_none());
    }
}
