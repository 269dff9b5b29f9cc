//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellValue`] - The value a cell evaluates to
//! - [`CellStorage`] - Sparse row-major cell storage

mod address;
mod storage;
mod value;

pub use address::CellAddress;
pub use storage::CellStorage;
pub use value::{format_number, CellValue};
