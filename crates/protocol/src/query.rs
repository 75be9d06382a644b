use crate::candidate::SourceKind;
use serde::{Deserialize, Serialize};

/// Per-source enable flags for one retrieval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledSources {
    pub similarity: bool,
    pub graph: bool,
    pub document: bool,
}

impl EnabledSources {
    pub const fn all() -> Self {
        Self {
            similarity: true,
            graph: true,
            document: true,
        }
    }

    pub const fn enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Similarity => self.similarity,
            SourceKind::Graph => self.graph,
            SourceKind::Document => self.document,
        }
    }
}

impl Default for EnabledSources {
    fn default() -> Self {
        Self::all()
    }
}

/// One retrieval request. Immutable for the duration of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub text: String,
    /// Restricts backends to a single knowledge domain when set.
    pub domain: Option<String>,
    /// Requested number of fused results.
    pub top_k: usize,
    pub sources: EnabledSources,
    /// Whether the re-rank / confidence-filter stage runs.
    pub rerank: bool,
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            domain: None,
            top_k: 10,
            sources: EnabledSources::all(),
            rerank: true,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_sources(mut self, sources: EnabledSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }
}
