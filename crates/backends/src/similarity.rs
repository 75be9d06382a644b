use crate::error::Result;
use crate::{domain_matches, terms};
use async_trait::async_trait;
use ndarray::Array1;
use sha2::{Digest, Sha256};

/// One nearest-neighbor hit from a similarity index.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub text: String,
    /// Cosine-style relevance in [0, 1].
    pub score: f32,
    pub domain: Option<String>,
}

/// Semantic similarity backend: embedding lookup over indexed text spans.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn similar(
        &self,
        query: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>>;
}

struct IndexedText {
    text: String,
    domain: Option<String>,
    vector: Array1<f32>,
}

/// In-memory similarity index over hashed bag-of-words pseudo-embeddings.
///
/// Tokens are hashed into a fixed number of buckets and the bucket counts are
/// L2-normalized, so cosine similarity reduces to a dot product. Crude next
/// to a real embedding model, but fully deterministic, which is what the
/// reference backend is for.
pub struct InMemorySimilarityIndex {
    dimension: usize,
    entries: Vec<IndexedText>,
}

impl InMemorySimilarityIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, text: impl Into<String>, domain: Option<&str>) {
        let text = text.into();
        let vector = self.embed(&text);
        self.entries.push(IndexedText {
            text,
            domain: domain.map(str::to_string),
            vector,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn embed(&self, text: &str) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.dimension);
        for term in terms(text) {
            vector[bucket(&term, self.dimension)] += 1.0;
        }
        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector /= norm;
        }
        vector
    }
}

#[async_trait]
impl SimilarityIndex for InMemorySimilarityIndex {
    async fn similar(
        &self,
        query: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>> {
        let query_vector = self.embed(query);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| domain_matches(entry.domain.as_deref(), domain))
            .map(|(id, entry)| (id, query_vector.dot(&entry.vector).clamp(0.0, 1.0)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Insertion id breaks score ties so repeated queries order identically.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(limit);
        log::debug!("similarity: {} hits for {:?}", scored.len(), query);

        Ok(scored
            .into_iter()
            .map(|(id, score)| SimilarityHit {
                text: self.entries[id].text.clone(),
                score,
                domain: self.entries[id].domain.clone(),
            })
            .collect())
    }
}

/// Stable token bucket: first eight digest bytes, reduced modulo `dimension`.
/// `DefaultHasher` is seeded per-process and would break cross-run determinism.
fn bucket(term: &str, dimension: usize) -> usize {
    let digest = Sha256::digest(term.as_bytes());
    let mut value = [0u8; 8];
    value.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(value) % dimension as u64) as usize
}
