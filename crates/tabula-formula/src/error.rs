//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing a formula or building its AST
///
/// Evaluation never fails: type mismatches, division by zero and
/// runaway reference chains all produce an empty value instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Reference text that does not name a cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl From<FormulaError> for tabula_core::Error {
    fn from(err: FormulaError) -> Self {
        tabula_core::Error::Formula(err.to_string())
    }
}
