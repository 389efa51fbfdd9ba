use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown strategy: {0} (expected first, best, or fallback)")]
    UnknownStrategy(String),

    #[error("unknown edge case: {0}")]
    UnknownEdgeCase(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
