use crate::candidate::SourceKind;
use crate::key::CanonicalKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node in the attribution view; `id` is the positional index of the
/// corresponding fused result in the final ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: usize,
    pub key: CanonicalKey,
    pub sources: Vec<SourceKind>,
    pub domain: Option<String>,
    /// Truncated content for display.
    pub summary: String,
}

/// Directed edge between two nodes of the same summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEdge {
    pub from: usize,
    pub to: usize,
    pub relation: String,
}

/// Read-only projection of a fused result list for explainability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeSummary {
    pub nodes: Vec<SummaryNode>,
    pub edges: Vec<SummaryEdge>,
    /// Result count per contributing source kind (`SourceKind::as_str` keys).
    pub source_counts: BTreeMap<String, usize>,
    /// Result count per domain tag.
    pub domain_counts: BTreeMap<String, usize>,
}

impl KnowledgeSummary {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
