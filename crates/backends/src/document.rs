use crate::error::Result;
use crate::{domain_matches, terms};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// One full-text hit.
#[derive(Debug, Clone)]
pub struct DocumentHit {
    pub excerpt: String,
    /// Term-frequency relevance in [0, 1].
    pub score: f32,
    pub domain: Option<String>,
}

/// Full-text document backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn search(
        &self,
        query: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentHit>>;
}

struct StoredDocument {
    text: String,
    domain: Option<String>,
    term_counts: HashMap<String, usize>,
    length: usize,
}

/// In-memory inverted index with tf scoring normalized to [0, 1].
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Vec<StoredDocument>,
    postings: HashMap<String, Vec<usize>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: impl Into<String>, domain: Option<&str>) {
        let text = text.into();
        let doc_terms = terms(&text);
        let id = self.documents.len();

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        for term in &doc_terms {
            *term_counts.entry(term.clone()).or_insert(0) += 1;
        }
        for term in term_counts.keys() {
            self.postings.entry(term.clone()).or_default().push(id);
        }

        self.documents.push(StoredDocument {
            text,
            domain: domain.map(str::to_string),
            term_counts,
            length: doc_terms.len().max(1),
        });
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn search(
        &self,
        query: &str,
        domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentHit>> {
        let query_terms: Vec<String> = terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }
        let unique_terms: HashSet<&String> = query_terms.iter().collect();

        let mut matched: HashSet<usize> = HashSet::new();
        for term in &unique_terms {
            if let Some(ids) = self.postings.get(*term) {
                matched.extend(ids.iter().copied());
            }
        }

        let mut scored: Vec<(usize, f32)> = matched
            .into_iter()
            .filter(|&id| domain_matches(self.documents[id].domain.as_deref(), domain))
            .map(|id| {
                let doc = &self.documents[id];
                // Fraction of query terms present, weighted by how much of
                // the document they cover; bounded to [0, 1] by construction.
                let present = unique_terms
                    .iter()
                    .filter(|t| doc.term_counts.contains_key(**t))
                    .count() as f32
                    / unique_terms.len() as f32;
                let coverage: usize = unique_terms
                    .iter()
                    .filter_map(|t| doc.term_counts.get(*t))
                    .sum();
                let density = (coverage as f32 / doc.length as f32).min(1.0);
                (id, (0.7 * present + 0.3 * density).clamp(0.0, 1.0))
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(limit);
        log::debug!("documents: {} hits for {:?}", scored.len(), query);

        Ok(scored
            .into_iter()
            .map(|(id, score)| DocumentHit {
                excerpt: self.documents[id].text.clone(),
                score,
                domain: self.documents[id].domain.clone(),
            })
            .collect())
    }
}
