use thiserror::Error;

/// Core error types for Bookshelf operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid book id: {0}")]
    InvalidId(String),
}

impl CoreError {
    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
