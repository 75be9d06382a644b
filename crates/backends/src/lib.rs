//! # Knowledge Backends
//!
//! Capability traits for the three backing stores the fusion pipeline
//! retrieves from, plus deterministic in-memory implementations:
//!
//! - [`SimilarityIndex`]: embedding-style nearest-neighbor lookup
//! - [`GraphStore`]: entity/relationship neighborhood lookup
//! - [`DocumentStore`]: full-text search
//!
//! The in-memory implementations are reference backends: they keep the
//! adapter contract honest in tests and demos without any network or storage
//! engine behind them. Production deployments inject their own
//! implementations of the same traits.

mod document;
mod error;
mod graph;
mod similarity;

pub use document::{DocumentHit, DocumentStore, InMemoryDocumentStore};
pub use error::{BackendError, Result};
pub use graph::{EntityHit, GraphStore, InMemoryGraphStore};
pub use similarity::{InMemorySimilarityIndex, SimilarityHit, SimilarityIndex};

/// Lowercased alphanumeric terms of a query or document, in order.
pub(crate) fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Domain filter shared by the in-memory backends: an item with no domain tag
/// matches every requested domain.
pub(crate) fn domain_matches(item: Option<&str>, requested: Option<&str>) -> bool {
    match (item, requested) {
        (_, None) | (None, _) => true,
        (Some(item), Some(requested)) => item.eq_ignore_ascii_case(requested),
    }
}
