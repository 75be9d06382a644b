use knowledge_protocol::WeightError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FusionError>;

/// Errors surfaced to callers. Adapter failures are deliberately absent:
/// they degrade the result set instead of failing the call.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error("top_k must be greater than zero")]
    InvalidTopK,

    #[error(transparent)]
    Weights(#[from] WeightError),
}
