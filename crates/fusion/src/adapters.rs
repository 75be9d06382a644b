use async_trait::async_trait;
use knowledge_backends::{BackendError, DocumentStore, GraphStore, SimilarityIndex};
use knowledge_protocol::{Candidate, CandidateContent, EntityRelation, SourceKind};
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single source adapter. Never propagated to callers; the
/// engine logs it and continues with the remaining sources.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AdapterError(pub String);

impl From<BackendError> for AdapterError {
    fn from(err: BackendError) -> Self {
        AdapterError(err.to_string())
    }
}

pub type AdapterResult = std::result::Result<Vec<Candidate>, AdapterError>;

/// Uniform retrieval capability over one backend.
///
/// Implementations return their backend's own relevance ordering; ranks are
/// 0-based positions in that ordering and raw scores land in [0, 1].
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn retrieve(&self, query: &str, domain: Option<&str>, limit: usize) -> AdapterResult;
}

/// Adapter over a semantic similarity index.
pub struct SimilarityAdapter {
    index: Arc<dyn SimilarityIndex>,
}

impl SimilarityAdapter {
    pub fn new(index: Arc<dyn SimilarityIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl SourceAdapter for SimilarityAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Similarity
    }

    async fn retrieve(&self, query: &str, domain: Option<&str>, limit: usize) -> AdapterResult {
        let hits = self.index.similar(query, domain, limit).await?;
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                Candidate::new(
                    CandidateContent::text(hit.text),
                    hit.score,
                    rank,
                    SourceKind::Similarity,
                    hit.domain,
                )
            })
            .collect())
    }
}

/// Adapter over a relationship graph.
pub struct GraphAdapter {
    store: Arc<dyn GraphStore>,
}

impl GraphAdapter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SourceAdapter for GraphAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Graph
    }

    async fn retrieve(&self, query: &str, domain: Option<&str>, limit: usize) -> AdapterResult {
        let hits = self.store.neighbors(query, domain, limit).await?;
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                let relations = hit
                    .relations
                    .into_iter()
                    .map(|(predicate, target)| EntityRelation::new(predicate, target))
                    .collect();
                Candidate::new(
                    CandidateContent::entity(hit.name, relations),
                    hit.score,
                    rank,
                    SourceKind::Graph,
                    hit.domain,
                )
            })
            .collect())
    }
}

/// Adapter over a full-text document store.
pub struct DocumentAdapter {
    store: Arc<dyn DocumentStore>,
}

impl DocumentAdapter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SourceAdapter for DocumentAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Document
    }

    async fn retrieve(&self, query: &str, domain: Option<&str>, limit: usize) -> AdapterResult {
        let hits = self.store.search(query, domain, limit).await?;
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                Candidate::new(
                    CandidateContent::text(hit.excerpt),
                    hit.score,
                    rank,
                    SourceKind::Document,
                    hit.domain,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_backends::{InMemoryGraphStore, InMemorySimilarityIndex, Result as BackendResult, SimilarityHit};

    struct BrokenIndex;

    #[async_trait]
    impl SimilarityIndex for BrokenIndex {
        async fn similar(
            &self,
            _query: &str,
            _domain: Option<&str>,
            _limit: usize,
        ) -> BackendResult<Vec<SimilarityHit>> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn similarity_adapter_assigns_ranks_in_backend_order() {
        let mut index = InMemorySimilarityIndex::new(128);
        index.add("alpha centauri distance", None);
        index.add("alpha particle decay", None);

        let adapter = SimilarityAdapter::new(Arc::new(index));
        let candidates = adapter.retrieve("alpha", None, 10).await.unwrap();

        assert!(!candidates.is_empty());
        for (expected_rank, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.rank, expected_rank);
            assert_eq!(candidate.source, SourceKind::Similarity);
        }
    }

    #[tokio::test]
    async fn graph_adapter_preserves_relations() {
        let mut store = InMemoryGraphStore::new();
        store.add_entity("cache-layer", Some("infra"));
        store.relate("cache-layer", "fronts", "primary-db");

        let adapter = GraphAdapter::new(Arc::new(store));
        let candidates = adapter.retrieve("cache layer", None, 10).await.unwrap();

        let entity = candidates
            .iter()
            .find(|c| c.content.display_text() == "cache-layer")
            .unwrap();
        match &entity.content {
            CandidateContent::Entity { relations, .. } => {
                assert_eq!(relations[0], EntityRelation::new("fronts", "primary-db"));
            }
            CandidateContent::Text { .. } => panic!("graph adapter must emit entity content"),
        }
    }

    #[tokio::test]
    async fn backend_errors_surface_as_adapter_errors() {
        let adapter = SimilarityAdapter::new(Arc::new(BrokenIndex));
        let err = adapter.retrieve("anything", None, 5).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
