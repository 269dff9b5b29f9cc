//! Cell storage implementation
//!
//! This module provides sparse storage for spreadsheet cells.
//! Only non-empty cells are stored, using a row-based BTreeMap structure.

use std::collections::BTreeMap;

use super::CellAddress;

/// Sparse row-based storage for cells
///
/// - Uses BTreeMap for ordered iteration (saves come out row-major)
/// - Only stores cells that were set (absent means empty)
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, T>>`
#[derive(Debug, Clone)]
pub struct CellStorage<T> {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u32, T>>,
}

impl<T> Default for CellStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CellStorage<T> {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Get a cell
    pub fn get(&self, addr: CellAddress) -> Option<&T> {
        self.rows.get(&addr.row).and_then(|r| r.get(&addr.col))
    }

    /// Store a cell, returning the previous one
    pub fn insert(&mut self, addr: CellAddress, cell: T) -> Option<T> {
        self.rows.entry(addr.row).or_default().insert(addr.col, cell)
    }

    /// Remove a cell
    pub fn remove(&mut self, addr: CellAddress) -> Option<T> {
        let result = self
            .rows
            .get_mut(&addr.row)
            .and_then(|r| r.remove(&addr.col));

        // Clean up empty rows
        if let Some(row_map) = self.rows.get(&addr.row) {
            if row_map.is_empty() {
                self.rows.remove(&addr.row);
            }
        }

        result
    }

    /// Clear all cells
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the cells inside the inclusive rectangle spanned by
    /// `top_left` and `bottom_right`, in row-major order.
    ///
    /// Only stored cells are visited, so the cost follows the number of
    /// cells in range rather than the area of the rectangle. `top_left`
    /// must not lie below or right of `bottom_right`.
    pub fn iter_range(
        &self,
        top_left: CellAddress,
        bottom_right: CellAddress,
    ) -> impl Iterator<Item = (CellAddress, &T)> {
        let cols = top_left.col..=bottom_right.col;
        self.rows
            .range(top_left.row..=bottom_right.row)
            .flat_map(move |(&row, row_data)| {
                row_data
                    .range(cols.clone())
                    .map(move |(&col, cell)| (CellAddress::new(row, col), cell))
            })
    }

    /// Iterate over all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &T)> {
        self.rows.iter().flat_map(|(&row, cols)| {
            cols.iter()
                .map(move |(&col, cell)| (CellAddress::new(row, col), cell))
        })
    }
}
