use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Index serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot embed empty text")]
    EmptyText,

    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("Invalid policy file: {0}")]
    InvalidPolicies(String),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<SearchError> for nexus_core::error::Error {
    fn from(err: SearchError) -> Self {
        use nexus_core::error::Error;
        match err {
            SearchError::DimensionMismatch { expected, actual } => {
                Error::DimensionMismatch { expected, actual }
            }
            SearchError::Io(e) => Error::Io(e),
            other @ (SearchError::EmptyText | SearchError::Model(_)) => {
                Error::Embedding(other.to_string())
            }
            other @ (SearchError::InvalidPolicies(_) | SearchError::Json(_)) => {
                Error::Config(other.to_string())
            }
            other => Error::VectorStore(other.to_string()),
        }
    }
}
