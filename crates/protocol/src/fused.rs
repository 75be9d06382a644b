use crate::candidate::{CandidateContent, SourceKind};
use crate::key::CanonicalKey;
use serde::{Deserialize, Serialize};

/// One deduplicated result with contributions accumulated across sources.
///
/// Mutable only during the single-threaded merge step; after scoring and
/// sorting the engine treats it as frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResult {
    pub key: CanonicalKey,
    pub content: CandidateContent,
    pub domain: Option<String>,
    /// Raw backend scores, one slot per [`SourceKind::index`]; 0.0 if absent.
    pub raw_scores: [f32; SourceKind::COUNT],
    /// Best (lowest) rank seen per source, where known.
    pub ranks: [Option<usize>; SourceKind::COUNT],
    /// Accumulated weighted reciprocal-rank-fusion component.
    pub rrf_total: f32,
    /// Final blended ranking score; set by the engine after merge.
    pub hybrid_score: f32,
    /// Source kinds that contributed, in first-seen order, without repeats.
    pub sources: Vec<SourceKind>,
}

impl FusedResult {
    pub fn new(key: CanonicalKey, content: CandidateContent, domain: Option<String>) -> Self {
        Self {
            key,
            content,
            domain,
            raw_scores: [0.0; SourceKind::COUNT],
            ranks: [None; SourceKind::COUNT],
            rrf_total: 0.0,
            hybrid_score: 0.0,
            sources: Vec::new(),
        }
    }

    /// Fold one adapter contribution into this result.
    ///
    /// RRF contributions add up; the per-source raw slot keeps the maximum so
    /// an adapter that reports the same key twice cannot inflate it.
    pub fn record(&mut self, source: SourceKind, raw_score: f32, rank: usize, rrf: f32) {
        let slot = source.index();
        self.raw_scores[slot] = self.raw_scores[slot].max(raw_score);
        self.ranks[slot] = Some(match self.ranks[slot] {
            Some(existing) => existing.min(rank),
            None => rank,
        });
        self.rrf_total += rrf;
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Adopt richer content for this key: entity content (which carries
    /// relations needed for summary edges) wins over plain text, and a domain
    /// tag wins over none.
    pub fn absorb_content(&mut self, content: &CandidateContent, domain: Option<&str>) {
        if content.is_entity() && !self.content.is_entity() {
            self.content = content.clone();
        }
        if self.domain.is_none() {
            self.domain = domain.map(str::to_string);
        }
    }

    pub fn has_source(&self, kind: SourceKind) -> bool {
        self.sources.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fused(text: &str) -> FusedResult {
        FusedResult::new(
            CanonicalKey::from_text(text),
            CandidateContent::text(text),
            None,
        )
    }

    #[test]
    fn record_accumulates_rrf_and_keeps_max_raw() {
        let mut result = fused("alpha");
        result.record(SourceKind::Similarity, 0.9, 1, 0.016);
        result.record(SourceKind::Similarity, 0.4, 0, 0.016);

        assert!((result.rrf_total - 0.032).abs() < 1e-6);
        assert_eq!(result.raw_scores[SourceKind::Similarity.index()], 0.9);
        assert_eq!(result.ranks[SourceKind::Similarity.index()], Some(0));
        assert_eq!(result.sources, vec![SourceKind::Similarity]);
    }

    #[test]
    fn sources_are_tracked_once_per_kind() {
        let mut result = fused("alpha");
        result.record(SourceKind::Graph, 0.5, 0, 0.01);
        result.record(SourceKind::Document, 0.5, 0, 0.01);
        result.record(SourceKind::Graph, 0.5, 1, 0.01);

        assert_eq!(result.sources, vec![SourceKind::Graph, SourceKind::Document]);
        assert!(result.has_source(SourceKind::Graph));
        assert!(!result.has_source(SourceKind::Similarity));
    }

    #[test]
    fn entity_content_replaces_text_content() {
        let mut result = fused("k8s-autoscale");
        let entity = CandidateContent::entity("k8s-autoscale", vec![]);
        result.absorb_content(&entity, Some("infra"));

        assert!(result.content.is_entity());
        assert_eq!(result.domain.as_deref(), Some("infra"));

        // Text content never downgrades entity content.
        result.absorb_content(&CandidateContent::text("k8s-autoscale"), Some("other"));
        assert!(result.content.is_entity());
        assert_eq!(result.domain.as_deref(), Some("infra"));
    }
}
