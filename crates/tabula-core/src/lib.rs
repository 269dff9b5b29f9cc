//! # tabula-core
//!
//! Core data structures for the tabula spreadsheet engine.
//!
//! This crate provides the fundamental types used throughout tabula:
//! - [`CellAddress`] - Cell addressing and the A1 text codec
//! - [`CellValue`] - Evaluated cell values (empty, number, text)
//! - [`CellStorage`] - Sparse storage for cells
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{CellAddress, CellStorage, CellValue};
//!
//! let mut storage = CellStorage::new();
//! let addr = CellAddress::parse("B2").unwrap();
//! storage.insert(addr, CellValue::Number(2.5));
//!
//! assert_eq!(addr.to_string(), "B2");
//! assert_eq!(storage.get(addr), Some(&CellValue::Number(2.5)));
//! ```

pub mod cell;
pub mod error;

// Re-exports for convenience
pub use cell::{format_number, CellAddress, CellStorage, CellValue};
pub use error::{Error, Result};
