//! Error types for cache store operations

/// Errors from cache store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("cache parse error: {0}")]
    Parse(String),
}

/// Result alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
