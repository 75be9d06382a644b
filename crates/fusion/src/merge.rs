use crate::config::FusionConfig;
use knowledge_protocol::{Candidate, CanonicalKey, FusedResult, FusionWeights, SourceKind};
use std::collections::BTreeMap;

/// Deduplicating merge over all adapters' candidate lists.
///
/// For a candidate at 0-based rank `r` from source `s`, the RRF contribution
/// is `weight(s) / (r + rrf_k)`; contributions for the same canonical key are
/// accumulated, never overwritten. The map is keyed by canonical key, so the
/// number of entries equals the number of distinct keys across all lists.
pub(crate) fn merge_candidate_lists(
    lists: &[Vec<Candidate>],
    weights: &FusionWeights,
    rrf_k: f32,
) -> BTreeMap<CanonicalKey, FusedResult> {
    let mut merged: BTreeMap<CanonicalKey, FusedResult> = BTreeMap::new();

    for list in lists {
        for candidate in list {
            let key = CanonicalKey::from_content(&candidate.content);
            let entry = merged.entry(key.clone()).or_insert_with(|| {
                FusedResult::new(key, candidate.content.clone(), candidate.domain.clone())
            });
            entry.absorb_content(&candidate.content, candidate.domain.as_deref());

            let rrf = weights.get(candidate.source) / (candidate.rank as f32 + rrf_k);
            entry.record(candidate.source, candidate.score, candidate.rank, rrf);
        }
    }

    merged
}

/// Blend accumulated RRF with weighted raw relevance into the hybrid score.
pub(crate) fn score_results(
    merged: BTreeMap<CanonicalKey, FusedResult>,
    weights: &FusionWeights,
    config: &FusionConfig,
) -> Vec<FusedResult> {
    merged
        .into_values()
        .map(|mut result| {
            let raw: f32 = SourceKind::ALL
                .iter()
                .map(|&kind| result.raw_scores[kind.index()] * weights.get(kind))
                .sum();
            result.hybrid_score = config.rrf_blend * result.rrf_total + config.raw_blend * raw;
            result
        })
        .collect()
}

/// Descending by hybrid score, ties broken by ascending canonical key so
/// identical inputs always order identically.
pub(crate) fn sort_results(results: &mut [FusedResult]) {
    results.sort_by(|a, b| {
        b.hybrid_score
            .total_cmp(&a.hybrid_score)
            .then_with(|| a.key.cmp(&b.key))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_protocol::CandidateContent;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn text_candidate(body: &str, score: f32, rank: usize, source: SourceKind) -> Candidate {
        Candidate::new(CandidateContent::text(body), score, rank, source, None)
    }

    #[test]
    fn distinct_keys_produce_one_result_each() {
        let lists = vec![
            vec![
                text_candidate("alpha", 0.9, 0, SourceKind::Similarity),
                text_candidate("beta", 0.8, 1, SourceKind::Similarity),
            ],
            vec![
                text_candidate("Alpha", 0.7, 0, SourceKind::Document),
                text_candidate("gamma", 0.6, 1, SourceKind::Document),
            ],
        ];

        let merged = merge_candidate_lists(&lists, &FusionWeights::default(), 60.0);
        assert_eq!(merged.len(), 3);

        let alpha = &merged[&CanonicalKey::from_text("alpha")];
        assert_eq!(
            alpha.sources,
            vec![SourceKind::Similarity, SourceKind::Document]
        );
    }

    #[test]
    fn contributions_accumulate_additively() {
        let weights = FusionWeights::default();
        let lists = vec![
            vec![text_candidate("alpha", 0.9, 0, SourceKind::Similarity)],
            vec![text_candidate("alpha", 0.8, 2, SourceKind::Graph)],
        ];

        let merged = merge_candidate_lists(&lists, &weights, 60.0);
        let alpha = &merged[&CanonicalKey::from_text("alpha")];

        let expected = weights.get(SourceKind::Similarity) / 60.0
            + weights.get(SourceKind::Graph) / 62.0;
        assert!((alpha.rrf_total - expected).abs() < 1e-6);
        assert_eq!(alpha.raw_scores[SourceKind::Similarity.index()], 0.9);
        assert_eq!(alpha.raw_scores[SourceKind::Graph.index()], 0.8);
        assert_eq!(alpha.ranks[SourceKind::Graph.index()], Some(2));
    }

    #[test]
    fn duplicate_key_from_one_adapter_keeps_max_raw_score() {
        let lists = vec![vec![
            text_candidate("alpha", 0.4, 0, SourceKind::Document),
            text_candidate("alpha", 0.9, 3, SourceKind::Document),
        ]];

        let merged = merge_candidate_lists(&lists, &FusionWeights::default(), 60.0);
        let alpha = &merged[&CanonicalKey::from_text("alpha")];
        assert_eq!(alpha.raw_scores[SourceKind::Document.index()], 0.9);
        assert_eq!(alpha.ranks[SourceKind::Document.index()], Some(0));
        // Both appearances still contribute rank agreement.
        assert!(alpha.rrf_total > FusionWeights::default().get(SourceKind::Document) / 60.0);
    }

    #[test]
    fn hybrid_score_blends_rrf_and_raw_components() {
        let weights = FusionWeights::default();
        let config = FusionConfig::default();
        let lists = vec![vec![text_candidate("alpha", 1.0, 0, SourceKind::Similarity)]];

        let merged = merge_candidate_lists(&lists, &weights, config.rrf_k);
        let results = score_results(merged, &weights, &config);

        let rrf = weights.get(SourceKind::Similarity) / 60.0;
        let raw = 1.0 * weights.get(SourceKind::Similarity);
        assert!((results[0].hybrid_score - (0.7 * rrf + 0.3 * raw)).abs() < 1e-6);
    }

    #[test]
    fn sort_breaks_ties_by_key() {
        let weights = FusionWeights::default();
        let config = FusionConfig::default();
        let lists = vec![vec![
            text_candidate("zeta", 0.5, 0, SourceKind::Document),
            text_candidate("alpha", 0.5, 0, SourceKind::Document),
        ]];

        // Same rank and score is impossible from one backend list, but the
        // tie-break must hold regardless of how scores collide.
        let mut results = score_results(
            merge_candidate_lists(&lists, &weights, config.rrf_k),
            &weights,
            &config,
        );
        for result in &mut results {
            result.hybrid_score = 0.5;
        }
        sort_results(&mut results);
        assert_eq!(results[0].key, CanonicalKey::from_text("alpha"));
        assert_eq!(results[1].key, CanonicalKey::from_text("zeta"));
    }

    proptest! {
        #[test]
        fn merged_len_equals_distinct_key_count(
            bodies in proptest::collection::vec("[a-d]{1,3}", 0..12),
        ) {
            let list: Vec<Candidate> = bodies
                .iter()
                .enumerate()
                .map(|(rank, body)| text_candidate(body, 0.5, rank, SourceKind::Document))
                .collect();
            let distinct: HashSet<CanonicalKey> = list
                .iter()
                .map(|c| CanonicalKey::from_content(&c.content))
                .collect();

            let merged = merge_candidate_lists(
                std::slice::from_ref(&list),
                &FusionWeights::default(),
                60.0,
            );
            prop_assert_eq!(merged.len(), distinct.len());
        }
    }
}
