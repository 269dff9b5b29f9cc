//! Prelude module - common imports for tabula users
//!
//! ```rust
//! use tabula::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellAddress,
    CellValue,
    // Error types
    Error,
    // Options
    EvaluationOptions,
    PersistError,
    Result,
    // Main types
    Spreadsheet,
};
