use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Tunables for the fusion pipeline. All fields have defaults, so a JSON
/// config may override any subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// RRF smoothing constant; keeps low-ranked items from dominating
    /// through many weak signals.
    pub rrf_k: f32,
    /// Share of the hybrid score taken from cross-source rank agreement.
    pub rrf_blend: f32,
    /// Share of the hybrid score taken from weighted raw relevance.
    pub raw_blend: f32,
    /// Each adapter is asked for `oversample × top_k` candidates to
    /// compensate for deduplication and filtering.
    pub oversample: usize,
    /// Minimum adjusted score a result needs to survive re-ranking.
    pub confidence_threshold: f32,
    /// Per-adapter time budget; an elapsed budget counts as a failure.
    pub adapter_timeout_ms: u64,
    /// Strength of the query-term-overlap boost.
    pub overlap_boost: f32,
    /// Multiplier for results with a graph-source contribution.
    pub graph_bonus: f32,
    /// Multiplier for results with a similarity-source contribution.
    pub similarity_bonus: f32,
    /// Multiplier for results outside the preferred domains.
    pub domain_penalty: f32,
    /// How many leading entries of a domain-preference list count as
    /// preferred.
    pub preferred_domain_window: usize,
    pub expansion: ExpansionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// `top_k` of the seeding pass.
    pub seed_top_k: usize,
    /// How many top phase-1 results are mined for expansion terms.
    pub seed_window: usize,
    /// Maximum expansion terms appended to the query.
    pub max_terms: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            rrf_blend: 0.7,
            raw_blend: 0.3,
            oversample: 2,
            confidence_threshold: 0.7,
            adapter_timeout_ms: 2000,
            overlap_boost: 0.2,
            graph_bonus: 1.05,
            similarity_bonus: 1.02,
            domain_penalty: 0.8,
            preferred_domain_window: 5,
            expansion: ExpansionConfig::default(),
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            seed_top_k: 5,
            seed_window: 3,
            max_terms: 3,
        }
    }
}

impl FusionConfig {
    pub fn from_json_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("invalid fusion config JSON")
    }

    /// Highest hybrid score any result can reach under this config: perfect
    /// raw scores at rank 0 from every source, full term overlap, and both
    /// source bonuses. A confidence threshold above this filters everything.
    pub fn score_ceiling(&self) -> f32 {
        (self.rrf_blend / self.rrf_k + self.raw_blend)
            * (1.0 + self.overlap_boost)
            * self.graph_bonus
            * self.similarity_bonus
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read fusion config {}", path.display()))?;
        Self::from_json_bytes(&bytes)
    }
}
