/// In-process fallback vector index
///
/// Used when no remote index is configured or the remote one cannot be
/// reached at startup. Documents live in a `RwLock`ed map; queries scan,
/// filter by metadata, and rank by cosine distance. Contents are lost on
/// restart, which is acceptable for a cache that is rebuilt by ordinary
/// writes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::embedding::{cosine_distance, embed};
use super::index::{Document, IndexError, MetadataFilter, SearchHit, VectorIndex};

struct StoredDoc {
    content: String,
    metadata: super::index::DocMetadata,
    embedding: Vec<f32>,
}

/// Memory-backed [`VectorIndex`]
#[derive(Default)]
pub struct EmbeddedIndex {
    docs: RwLock<HashMap<String, StoredDoc>>,
}

impl EmbeddedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for EmbeddedIndex {
    fn name(&self) -> &'static str {
        "embedded"
    }

    async fn upsert(&self, doc: Document) -> Result<(), IndexError> {
        let embedding = embed(&doc.content);
        self.docs.write().await.insert(
            doc.id,
            StoredDoc {
                content: doc.content,
                metadata: doc.metadata,
                embedding,
            },
        );
        Ok(())
    }

    async fn remove(&self, doc_id: &str) -> Result<(), IndexError> {
        self.docs.write().await.remove(doc_id);
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        filter: MetadataFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let query_embedding = embed(text);
        let docs = self.docs.read().await;

        let mut hits: Vec<SearchHit> = docs
            .iter()
            .filter(|(_, doc)| filter.matches(&doc.metadata))
            .map(|(id, doc)| SearchHit {
                doc_id: id.clone(),
                content: doc.content.clone(),
                metadata: doc.metadata,
                distance: cosine_distance(&query_embedding, &doc.embedding),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::index::{project_doc_id, task_doc_id, DocKind, DocMetadata};
    use uuid::Uuid;

    fn doc(id: String, content: &str, kind: DocKind, project_id: Uuid) -> Document {
        Document {
            id,
            content: content.to_string(),
            metadata: DocMetadata { kind, project_id },
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = EmbeddedIndex::new();
        let project_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();

        index
            .upsert(doc(task_doc_id(task_id), "old text", DocKind::Task, project_id))
            .await
            .unwrap();
        index
            .upsert(doc(task_doc_id(task_id), "new text", DocKind::Task, project_id))
            .await
            .unwrap();

        assert_eq!(index.len().await, 1);

        let filter = MetadataFilter {
            kind: None,
            project_id,
        };
        let hits = index.query("new text", filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "new text");
    }

    #[tokio::test]
    async fn test_remove_missing_id_is_ok() {
        let index = EmbeddedIndex::new();
        index.remove("task_nonexistent").await.unwrap();
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn test_query_filters_by_project() {
        let index = EmbeddedIndex::new();
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();

        index
            .upsert(doc(
                task_doc_id(Uuid::new_v4()),
                "paint the fence",
                DocKind::Task,
                project_a,
            ))
            .await
            .unwrap();
        index
            .upsert(doc(
                task_doc_id(Uuid::new_v4()),
                "paint the fence",
                DocKind::Task,
                project_b,
            ))
            .await
            .unwrap();

        let filter = MetadataFilter {
            kind: None,
            project_id: project_a,
        };
        let hits = index.query("paint fence", filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.project_id, project_a);
    }

    #[tokio::test]
    async fn test_query_filters_by_kind() {
        let index = EmbeddedIndex::new();
        let project_id = Uuid::new_v4();

        index
            .upsert(doc(
                project_doc_id(project_id),
                "bridge inspection program",
                DocKind::Project,
                project_id,
            ))
            .await
            .unwrap();
        index
            .upsert(doc(
                task_doc_id(Uuid::new_v4()),
                "bridge deck survey",
                DocKind::Task,
                project_id,
            ))
            .await
            .unwrap();

        let filter = MetadataFilter {
            kind: Some(DocKind::Task),
            project_id,
        };
        let hits = index.query("bridge", filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.kind, DocKind::Task);
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity_and_respects_limit() {
        let index = EmbeddedIndex::new();
        let project_id = Uuid::new_v4();

        index
            .upsert(doc(
                task_doc_id(Uuid::new_v4()),
                "replace broken guardrail section",
                DocKind::Task,
                project_id,
            ))
            .await
            .unwrap();
        index
            .upsert(doc(
                task_doc_id(Uuid::new_v4()),
                "order catering for the offsite",
                DocKind::Task,
                project_id,
            ))
            .await
            .unwrap();
        index
            .upsert(doc(
                task_doc_id(Uuid::new_v4()),
                "guardrail paint touch up",
                DocKind::Task,
                project_id,
            ))
            .await
            .unwrap();

        let filter = MetadataFilter {
            kind: Some(DocKind::Task),
            project_id,
        };
        let hits = index.query("guardrail repair", filter, 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[0].content.contains("guardrail"));
        assert!(hits[1].content.contains("guardrail"));
    }
}
