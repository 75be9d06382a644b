//! # Knowledge Protocol
//!
//! Shared data model for the hybrid retrieval-and-fusion pipeline.
//!
//! Everything that crosses a crate boundary lives here: queries, candidates
//! produced by source adapters, canonical deduplication keys, fused results,
//! fusion weights, and the derived knowledge summary used for attribution.

mod candidate;
mod fused;
mod key;
mod query;
mod summary;
mod weights;

pub use candidate::{Candidate, CandidateContent, EntityRelation, SourceKind};
pub use fused::FusedResult;
pub use key::CanonicalKey;
pub use query::{EnabledSources, RetrievalQuery};
pub use summary::{KnowledgeSummary, SummaryEdge, SummaryNode};
pub use weights::{FusionWeights, WeightError};
