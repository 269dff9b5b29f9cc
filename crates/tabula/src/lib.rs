//! # tabula
//!
//! A small spreadsheet engine.
//!
//! ## Features
//!
//! - Sparse cell store addressed in A1 notation
//! - Numbers, text and formulas with `+ - * / ^`, comparisons and
//!   relative/absolute (`$`) references
//! - Evaluation on read, with a step budget so cycles yield empty values
//! - Rectangular copy that moves relative references
//! - Compact binary save/load
//!
//! ## Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut sheet = Spreadsheet::new();
//! sheet.set("D1", "10").unwrap();
//! sheet.set("D2", "20").unwrap();
//! sheet.set("F11", "=D1+5").unwrap();
//!
//! // Copy one cell; the reference moves along
//! let dst = CellAddress::parse("G12").unwrap();
//! let src = CellAddress::parse("F11").unwrap();
//! sheet.copy_rect(dst, src, 1, 1);
//! assert_eq!(sheet.get_value(dst), CellValue::Number(25.0));
//!
//! let mut bytes = Vec::new();
//! sheet.save(&mut bytes).unwrap();
//! ```

pub mod copy;
pub mod persist;
pub mod prelude;
pub mod spreadsheet;

pub use persist::{PersistError, MAX_PAYLOAD_LEN};
pub use spreadsheet::{Cell, EvaluationOptions, FormulaCell, Spreadsheet};

// Re-export core types
pub use tabula_core::{format_number, CellAddress, CellValue, Error, Result};

// Re-export formula types
pub use tabula_formula::{
    parse_formula, EvalBudget, FormulaError, FormulaExpr, FormulaResult, DEFAULT_MAX_DEPTH,
    DEFAULT_STEP_BUDGET, MAX_EXPR_DEPTH, MAX_NESTING,
};
