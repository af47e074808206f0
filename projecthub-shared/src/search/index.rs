/// Vector index contract and document types
///
/// Everything that can be searched lives in the index as a [`Document`]:
/// a deterministic namespaced id, the searchable text, and a small
/// structured metadata tuple used for exact-match filtering at query time.
/// Implementations are interchangeable behind [`VectorIndex`]; callers get
/// the same semantics from a remote service and from the in-process
/// fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors from the vector index
///
/// These never cross the sync component boundary; see
/// [`SearchSync`](super::sync::SearchSync) for the failure policy.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Index could not be reached or refused the request
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// HTTP transport failure
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response did not match the expected shape
    #[error("unexpected index response: {0}")]
    Protocol(String),
}

/// What kind of entity a document represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Project,
    Task,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Project => "project",
            DocKind::Task => "task",
        }
    }
}

/// Structured metadata stored alongside each document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub kind: DocKind,
    pub project_id: Uuid,
}

/// A document to be indexed
#[derive(Debug, Clone)]
pub struct Document {
    /// Namespaced id (`project_{uuid}` or `task_{uuid}`); upserting the
    /// same id overwrites rather than duplicates
    pub id: String,
    pub content: String,
    pub metadata: DocMetadata,
}

/// Exact-match metadata filter applied before ranking
///
/// `project_id` is mandatory: a query is always scoped to one project,
/// mirroring the access check the caller already passed.
#[derive(Debug, Clone, Copy)]
pub struct MetadataFilter {
    pub kind: Option<DocKind>,
    pub project_id: Uuid,
}

impl MetadataFilter {
    pub fn matches(&self, metadata: &DocMetadata) -> bool {
        if metadata.project_id != self.project_id {
            return false;
        }
        match self.kind {
            Some(kind) => metadata.kind == kind,
            None => true,
        }
    }
}

/// One ranked query result; lower distance means more similar
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub content: String,
    pub metadata: DocMetadata,
    pub distance: f32,
}

/// Approximate-nearest-neighbor text store
///
/// Implementations must make `upsert` an idempotent overwrite keyed by
/// document id and `remove` a no-op for missing ids.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Implementation name, for logs
    fn name(&self) -> &'static str;

    async fn upsert(&self, doc: Document) -> Result<(), IndexError>;

    async fn remove(&self, doc_id: &str) -> Result<(), IndexError>;

    async fn query(
        &self,
        text: &str,
        filter: MetadataFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>, IndexError>;
}

/// Document id for a project
pub fn project_doc_id(project_id: Uuid) -> String {
    format!("project_{}", project_id)
}

/// Document id for a task
pub fn task_doc_id(task_id: Uuid) -> String {
    format!("task_{}", task_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_ids_are_namespaced() {
        let id = Uuid::new_v4();
        assert_eq!(project_doc_id(id), format!("project_{}", id));
        assert_eq!(task_doc_id(id), format!("task_{}", id));
        assert_ne!(project_doc_id(id), task_doc_id(id));
    }

    #[test]
    fn test_metadata_filter_scopes_by_project() {
        let project_id = Uuid::new_v4();
        let filter = MetadataFilter {
            kind: None,
            project_id,
        };

        assert!(filter.matches(&DocMetadata {
            kind: DocKind::Project,
            project_id,
        }));
        assert!(filter.matches(&DocMetadata {
            kind: DocKind::Task,
            project_id,
        }));
        assert!(!filter.matches(&DocMetadata {
            kind: DocKind::Task,
            project_id: Uuid::new_v4(),
        }));
    }

    #[test]
    fn test_metadata_filter_by_kind() {
        let project_id = Uuid::new_v4();
        let filter = MetadataFilter {
            kind: Some(DocKind::Task),
            project_id,
        };

        assert!(filter.matches(&DocMetadata {
            kind: DocKind::Task,
            project_id,
        }));
        assert!(!filter.matches(&DocMetadata {
            kind: DocKind::Project,
            project_id,
        }));
    }

    #[test]
    fn test_doc_kind_serde() {
        assert_eq!(serde_json::to_string(&DocKind::Task).unwrap(), r#""task""#);
        assert_eq!(
            serde_json::to_string(&DocKind::Project).unwrap(),
            r#""project""#
        );
    }
}
