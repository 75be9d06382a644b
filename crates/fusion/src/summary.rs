use knowledge_protocol::{
    CandidateContent, CanonicalKey, FusedResult, KnowledgeSummary, SummaryEdge, SummaryNode,
};
use std::collections::HashMap;

const NODE_SUMMARY_CHARS: usize = 120;

/// Project a finalized, ordered result list into a node/edge attribution
/// view. Pure function: the ordering of `results` fixes the synthetic ids.
///
/// Edges come only from entity results whose relations name another result
/// in the same list; dangling relations are dropped.
pub fn build_summary(results: &[FusedResult]) -> KnowledgeSummary {
    let mut summary = KnowledgeSummary::default();

    let mut id_by_key: HashMap<&CanonicalKey, usize> = HashMap::new();
    for (id, result) in results.iter().enumerate() {
        id_by_key.insert(&result.key, id);

        summary.nodes.push(SummaryNode {
            id,
            key: result.key.clone(),
            sources: result.sources.clone(),
            domain: result.domain.clone(),
            summary: result.content.summary(NODE_SUMMARY_CHARS),
        });

        for source in &result.sources {
            *summary
                .source_counts
                .entry(source.as_str().to_string())
                .or_insert(0) += 1;
        }
        if let Some(domain) = &result.domain {
            *summary.domain_counts.entry(domain.clone()).or_insert(0) += 1;
        }
    }

    for (from, result) in results.iter().enumerate() {
        let CandidateContent::Entity { relations, .. } = &result.content else {
            continue;
        };
        for relation in relations {
            let target_key = CanonicalKey::from_entity(&relation.target);
            let Some(&to) = id_by_key.get(&target_key) else {
                continue;
            };
            if to == from {
                continue;
            }
            summary.edges.push(SummaryEdge {
                from,
                to,
                relation: relation.predicate.clone(),
            });
        }
    }

    summary
}
