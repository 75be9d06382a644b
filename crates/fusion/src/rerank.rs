use crate::config::FusionConfig;
use crate::merge::sort_results;
use knowledge_protocol::{FusedResult, SourceKind};
use once_cell::sync::Lazy;
use std::collections::HashSet;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "by", "do", "does", "for", "how", "in", "is", "it", "of", "on",
        "or", "the", "to", "what", "when", "where", "which", "why", "with",
    ]
    .into_iter()
    .collect()
});

/// Lowercased content-bearing query terms, deduplicated in order.
pub(crate) fn query_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Adjust hybrid scores with lexical and source-type signals, then drop
/// everything below the confidence threshold. Runs after the merge, before
/// the final sort.
pub(crate) fn rerank(
    results: &mut Vec<FusedResult>,
    query_terms: &[String],
    domain_preferences: &[String],
    config: &FusionConfig,
) {
    let preferred: Vec<String> = domain_preferences
        .iter()
        .take(config.preferred_domain_window)
        .map(|d| d.to_lowercase())
        .collect();

    for result in results.iter_mut() {
        let overlap = term_overlap(query_terms, result.content.display_text());
        result.hybrid_score *= 1.0 + config.overlap_boost * overlap;

        if result.has_source(SourceKind::Graph) {
            result.hybrid_score *= config.graph_bonus;
        }
        if result.has_source(SourceKind::Similarity) {
            result.hybrid_score *= config.similarity_bonus;
        }

        if !domain_preferences.is_empty() {
            if let Some(domain) = &result.domain {
                if !preferred.iter().any(|p| p == &domain.to_lowercase()) {
                    result.hybrid_score *= config.domain_penalty;
                }
            }
        }
    }

    results.retain(|result| result.hybrid_score >= config.confidence_threshold);
    sort_results(results);
}

/// `|query ∩ content| / |query|` over lowercased terms.
fn term_overlap(query_terms: &[String], content: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let content_terms: HashSet<String> = content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .collect();
    let matched = query_terms
        .iter()
        .filter(|t| content_terms.contains(*t))
        .count();
    matched as f32 / query_terms.len() as f32
}
