use serde::{Deserialize, Serialize};
use std::fmt;

/// Which retrieval backend a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Semantic similarity index (embedding-based nearest neighbors).
    Similarity,
    /// Relationship graph (entities and their relations).
    Graph,
    /// Full-text document store.
    Document,
}

impl SourceKind {
    pub const COUNT: usize = 3;

    pub const ALL: [SourceKind; Self::COUNT] =
        [SourceKind::Similarity, SourceKind::Graph, SourceKind::Document];

    /// Stable slot index used for per-source score/rank arrays.
    pub const fn index(self) -> usize {
        match self {
            SourceKind::Similarity => 0,
            SourceKind::Graph => 1,
            SourceKind::Document => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Similarity => "similarity",
            SourceKind::Graph => "graph",
            SourceKind::Document => "document",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared relation from one graph entity to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRelation {
    /// Relation label (e.g. "depends_on", "part_of").
    pub predicate: String,
    /// Name of the target entity.
    pub target: String,
}

impl EntityRelation {
    pub fn new(predicate: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            target: target.into(),
        }
    }
}

/// Identity-relevant payload of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CandidateContent {
    /// A span of text (similarity index hit or document excerpt).
    Text { body: String },
    /// A named entity with its declared relations.
    Entity {
        name: String,
        relations: Vec<EntityRelation>,
    },
}

impl CandidateContent {
    pub fn text(body: impl Into<String>) -> Self {
        CandidateContent::Text { body: body.into() }
    }

    pub fn entity(name: impl Into<String>, relations: Vec<EntityRelation>) -> Self {
        CandidateContent::Entity {
            name: name.into(),
            relations,
        }
    }

    /// Text used for display and lexical term matching.
    pub fn display_text(&self) -> &str {
        match self {
            CandidateContent::Text { body } => body,
            CandidateContent::Entity { name, .. } => name,
        }
    }

    /// Truncated one-line summary for attribution views.
    pub fn summary(&self, max_chars: usize) -> String {
        let text = self.display_text();
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}…")
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, CandidateContent::Entity { .. })
    }
}

/// One adapter's ranked hit, before fusion.
///
/// Owned by the adapter call that produced it; the merge step copies what it
/// needs into [`crate::FusedResult`] and never mutates candidates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
    /// Raw relevance score reported by the backend, clamped to [0, 1].
    pub score: f32,
    /// 0-based position within the producing adapter's list.
    pub rank: usize,
    pub source: SourceKind,
    pub domain: Option<String>,
}

impl Candidate {
    pub fn new(
        content: CandidateContent,
        score: f32,
        rank: usize,
        source: SourceKind,
        domain: Option<String>,
    ) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            content,
            score,
            rank,
            source,
            domain,
        }
    }
}
