//! Error types for tabula-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabula-core and the layers built on it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Formula could not be parsed
    #[error("Formula error: {0}")]
    Formula(String),

    /// Cell content longer than a cell may hold
    #[error("Cell content is {len} bytes, the limit is {max}")]
    ContentTooLong { len: usize, max: u64 },
}
