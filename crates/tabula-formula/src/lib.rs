//! # tabula-formula
//!
//! Formula parser and evaluator for tabula.
//!
//! This crate provides:
//! - Formula parsing (text → builder calls → AST)
//! - Formula rendering (AST → text, as seen from any cell)
//! - Formula evaluation (AST → value) with a bounded step budget
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{CellAddress, CellValue};
//! use tabula_formula::{evaluate, parse_formula, CellSource, EvalBudget, SourceCell};
//!
//! struct Empty;
//! impl CellSource for Empty {
//!     fn cell(&self, _: CellAddress) -> Option<SourceCell<'_>> {
//!         None
//!     }
//! }
//!
//! let home = CellAddress::new(0, 0);
//! let ast = parse_formula("=2^10", home).unwrap();
//! let value = evaluate(&ast, &Empty, home, &mut EvalBudget::default());
//! assert_eq!(value, CellValue::Number(1024.0));
//! ```

pub mod ast;
pub mod builder;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{ArithmeticOperator, CellReference, CompareOperator, FormulaExpr, RefAxis};
pub use builder::{AstBuilder, ExprBuilder, MAX_EXPR_DEPTH};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, CellSource, EvalBudget, SourceCell, DEFAULT_MAX_DEPTH, DEFAULT_STEP_BUDGET,
};
pub use parser::{parse_formula, parse_formula_with, MAX_NESTING};
