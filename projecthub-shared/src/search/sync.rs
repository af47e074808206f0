/// Best-effort index synchronization
///
/// [`SearchSync`] is the only way the rest of the system touches the
/// vector index, and it enforces one policy everywhere: the index is a
/// cache, never a system of record. Sync methods return `()` and queries
/// return an empty list when the index misbehaves; the error is logged at
/// WARN and absorbed. A failed sync leaves that document stale until the
/// next successful write to the same entity. There is no retry queue.
///
/// Callers invoke sync methods after their database transaction commits;
/// nothing here can roll back or block an authoritative write.

use std::sync::Arc;

use uuid::Uuid;

use super::index::{
    project_doc_id, task_doc_id, DocKind, DocMetadata, Document, MetadataFilter, SearchHit,
    VectorIndex,
};
use crate::models::project::Project;
use crate::models::task::Task;

/// Handle to the vector index with the swallow-and-log failure policy
#[derive(Clone)]
pub struct SearchSync {
    index: Arc<dyn VectorIndex>,
}

impl SearchSync {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        SearchSync { index }
    }

    /// Name of the underlying index implementation, for logs
    pub fn index_name(&self) -> &'static str {
        self.index.name()
    }

    /// Upserts a project's searchable text
    pub async fn sync_project(&self, project: &Project) {
        let doc = Document {
            id: project_doc_id(project.id),
            content: project_text(project),
            metadata: DocMetadata {
                kind: DocKind::Project,
                project_id: project.id,
            },
        };

        if let Err(e) = self.index.upsert(doc).await {
            tracing::warn!(
                project_id = %project.id,
                error = %e,
                "failed to sync project to search index"
            );
        }
    }

    /// Upserts a task's searchable text
    pub async fn sync_task(&self, task: &Task) {
        let doc = Document {
            id: task_doc_id(task.id),
            content: task_text(task),
            metadata: DocMetadata {
                kind: DocKind::Task,
                project_id: task.project_id,
            },
        };

        if let Err(e) = self.index.upsert(doc).await {
            tracing::warn!(
                task_id = %task.id,
                error = %e,
                "failed to sync task to search index"
            );
        }
    }

    /// Removes a deleted project's document
    pub async fn remove_project(&self, project_id: Uuid) {
        if let Err(e) = self.index.remove(&project_doc_id(project_id)).await {
            tracing::warn!(
                project_id = %project_id,
                error = %e,
                "failed to remove project from search index"
            );
        }
    }

    /// Removes a deleted task's document
    pub async fn remove_task(&self, task_id: Uuid) {
        if let Err(e) = self.index.remove(&task_doc_id(task_id)).await {
            tracing::warn!(
                task_id = %task_id,
                error = %e,
                "failed to remove task from search index"
            );
        }
    }

    /// Free-text search over one project's documents
    ///
    /// The caller must already have verified access to `project_id`; the
    /// metadata filter keeps results inside that scope regardless of what
    /// the index contains.
    pub async fn search_project_documents(
        &self,
        project_id: Uuid,
        query: &str,
        limit: usize,
    ) -> Vec<SearchHit> {
        let filter = MetadataFilter {
            kind: None,
            project_id,
        };

        match self.index.query(query, filter, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(
                    project_id = %project_id,
                    error = %e,
                    "search index query failed, returning empty results"
                );
                Vec::new()
            }
        }
    }

    /// Tasks most similar to the given one, within its project
    pub async fn find_similar_tasks(&self, task: &Task, limit: usize) -> Vec<SearchHit> {
        let filter = MetadataFilter {
            kind: Some(DocKind::Task),
            project_id: task.project_id,
        };
        let own_id = task_doc_id(task.id);

        // Ask for one extra slot since the task itself usually ranks first.
        match self.index.query(&task_text(task), filter, limit + 1).await {
            Ok(hits) => {
                let mut hits: Vec<SearchHit> =
                    hits.into_iter().filter(|h| h.doc_id != own_id).collect();
                hits.truncate(limit);
                hits
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %task.id,
                    error = %e,
                    "similar-task query failed, returning empty results"
                );
                Vec::new()
            }
        }
    }
}

fn project_text(project: &Project) -> String {
    match &project.description {
        Some(description) => format!("{} {}", project.name, description),
        None => project.name.clone(),
    }
}

fn task_text(task: &Task) -> String {
    let mut text = task.title.clone();
    if let Some(description) = &task.description {
        text.push(' ');
        text.push_str(description);
    }
    if let Some(tags) = &task.tags {
        text.push(' ');
        text.push_str(tags);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use crate::models::Priority;
    use crate::search::embedded::EmbeddedIndex;
    use crate::search::index::IndexError;
    use async_trait::async_trait;
    use chrono::Utc;

    fn make_task(id: Uuid, project_id: Uuid, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            project_id,
            assignee_id: None,
            creator_id: Uuid::new_v4(),
            parent_task_id: None,
            estimated_hours: None,
            actual_hours: None,
            start_date: None,
            due_date: None,
            completed_at: None,
            is_milestone: false,
            tags: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Index that fails every call, for exercising the failure policy
    struct BrokenIndex;

    #[async_trait]
    impl VectorIndex for BrokenIndex {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn upsert(&self, _doc: Document) -> Result<(), IndexError> {
            Err(IndexError::Unavailable("down".to_string()))
        }

        async fn remove(&self, _doc_id: &str) -> Result<(), IndexError> {
            Err(IndexError::Unavailable("down".to_string()))
        }

        async fn query(
            &self,
            _text: &str,
            _filter: MetadataFilter,
            _limit: usize,
        ) -> Result<Vec<SearchHit>, IndexError> {
            Err(IndexError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let sync = SearchSync::new(Arc::new(BrokenIndex));
        let project_id = Uuid::new_v4();
        let task = make_task(Uuid::new_v4(), project_id, "anything");

        // None of these may panic or propagate an error.
        sync.sync_task(&task).await;
        sync.remove_task(task.id).await;
        sync.remove_project(project_id).await;

        assert!(sync
            .search_project_documents(project_id, "anything", 10)
            .await
            .is_empty());
        assert!(sync.find_similar_tasks(&task, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_find_similar_excludes_the_task_itself() {
        let sync = SearchSync::new(Arc::new(EmbeddedIndex::new()));
        let project_id = Uuid::new_v4();

        let target = make_task(Uuid::new_v4(), project_id, "inspect deck joints");
        let similar = make_task(Uuid::new_v4(), project_id, "inspect expansion joints");
        let other = make_task(Uuid::new_v4(), project_id, "order office supplies");

        sync.sync_task(&target).await;
        sync.sync_task(&similar).await;
        sync.sync_task(&other).await;

        let hits = sync.find_similar_tasks(&target, 5).await;
        let own_id = task_doc_id(target.id);
        assert!(hits.iter().all(|h| h.doc_id != own_id));
        assert_eq!(hits[0].doc_id, task_doc_id(similar.id));
    }

    #[tokio::test]
    async fn test_remove_leaves_other_documents_queryable() {
        let sync = SearchSync::new(Arc::new(EmbeddedIndex::new()));
        let project_id = Uuid::new_v4();

        let parent = make_task(Uuid::new_v4(), project_id, "drainage survey plan");
        let child = make_task(Uuid::new_v4(), project_id, "drainage survey field work");
        sync.sync_task(&parent).await;
        sync.sync_task(&child).await;

        sync.remove_task(parent.id).await;

        let hits = sync
            .search_project_documents(project_id, "drainage survey", 10)
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, task_doc_id(child.id));
    }

    #[tokio::test]
    async fn test_search_scoped_to_project() {
        let sync = SearchSync::new(Arc::new(EmbeddedIndex::new()));
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();

        sync.sync_task(&make_task(Uuid::new_v4(), project_a, "paving schedule"))
            .await;
        sync.sync_task(&make_task(Uuid::new_v4(), project_b, "paving schedule"))
            .await;

        let hits = sync.search_project_documents(project_a, "paving", 10).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.project_id, project_a);
    }

    #[test]
    fn test_task_text_includes_description_and_tags() {
        let mut task = make_task(Uuid::new_v4(), Uuid::new_v4(), "fix ramp");
        task.description = Some("south ramp surface".to_string());
        task.tags = Some("concrete,urgent".to_string());

        let text = task_text(&task);
        assert!(text.contains("fix ramp"));
        assert!(text.contains("south ramp surface"));
        assert!(text.contains("concrete,urgent"));
    }
}
