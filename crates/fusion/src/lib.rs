//! # Knowledge Fusion
//!
//! Hybrid retrieval-and-fusion engine: fans a query out to heterogeneous
//! retrieval backends, merges their ranked candidate lists with weighted
//! reciprocal-rank fusion, deduplicates by canonical key, re-ranks with
//! lexical and source-type signals, and returns one deterministic, ordered
//! result list plus an attribution summary.
//!
//! ## Pipeline
//!
//! ```text
//! RetrievalQuery
//!     │
//!     ├──> Source adapters (concurrent, per-adapter timeout)
//!     │      ├─ SimilarityAdapter  → semantic index
//!     │      ├─ GraphAdapter       → relationship graph
//!     │      └─ DocumentAdapter    → full-text store
//!     │
//!     ├──> Deduplicating merge (canonical keys, weighted RRF)
//!     ├──> Hybrid scoring (RRF blend + weighted raw scores)
//!     ├──> Re-rank / confidence filter (optional)
//!     ├──> Query expansion (optional second pass)
//!     └──> KnowledgeSummary (nodes/edges for attribution)
//! ```
//!
//! Adapter failures never abort a call: a failed or timed-out source simply
//! contributes nothing, and the outcome records which sources degraded.

mod adapters;
mod config;
mod engine;
mod error;
mod expansion;
mod merge;
mod rerank;
mod summary;

pub use adapters::{
    AdapterError, AdapterResult, DocumentAdapter, GraphAdapter, SimilarityAdapter, SourceAdapter,
};
pub use config::{ExpansionConfig, FusionConfig};
pub use engine::{
    FusionEngine, RetrievalContext, RetrievalOutcome, RetrievalStatus, SourceOutcome, SourceState,
};
pub use error::{FusionError, Result};
pub use summary::build_summary;
