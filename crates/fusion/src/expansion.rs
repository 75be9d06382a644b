use knowledge_protocol::{CandidateContent, FusedResult};
use std::collections::HashSet;

/// Mine expansion terms from the top phase-1 results.
///
/// Entity results contribute their entity name; text results contribute
/// capitalized tokens as a cheap named-entity heuristic. Terms already
/// present in the query are skipped, matching case-insensitively.
pub(crate) fn extract_expansion_terms(
    results: &[FusedResult],
    query_text: &str,
    seed_window: usize,
    max_terms: usize,
) -> Vec<String> {
    let query_lower: HashSet<String> = query_text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut terms = Vec::new();

    for result in results.iter().take(seed_window) {
        match &result.content {
            CandidateContent::Entity { name, .. } => {
                push_term(name, &query_lower, &mut seen, &mut terms);
            }
            CandidateContent::Text { body } => {
                for token in capitalized_tokens(body) {
                    push_term(&token, &query_lower, &mut seen, &mut terms);
                }
            }
        }
        if terms.len() >= max_terms {
            break;
        }
    }

    terms.truncate(max_terms);
    terms
}

fn push_term(
    term: &str,
    query_lower: &HashSet<String>,
    seen: &mut HashSet<String>,
    terms: &mut Vec<String>,
) {
    let lower = term.to_lowercase();
    if query_lower.contains(&lower) {
        return;
    }
    if seen.insert(lower) {
        terms.push(term.to_string());
    }
}

fn capitalized_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().count() >= 3)
        .filter(|t| t.chars().next().is_some_and(char::is_uppercase))
        .map(str::to_string)
        .collect()
}

/// Query text for the second retrieval pass.
pub(crate) fn expanded_query_text(original: &str, terms: &[String]) -> String {
    format!("{} {}", original, terms.join(" "))
}
