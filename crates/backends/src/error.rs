use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend query failed: {0}")]
    Query(String),

    #[error("backend timed out after {0} ms")]
    Timeout(u64),
}
