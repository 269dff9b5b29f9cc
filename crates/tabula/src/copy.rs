//! Rectangular copy between regions of a sheet

use crate::spreadsheet::{Cell, FormulaCell, Spreadsheet};
use tabula_core::CellAddress;

impl Spreadsheet {
    /// Copy the `width` x `height` rectangle whose top-left cell is `src`
    /// to the rectangle whose top-left cell is `dst`.
    ///
    /// Source and destination may overlap: every source cell is read
    /// before any destination cell is written. Empty source cells clear
    /// their destination, and so do source positions beyond the grid
    /// edge. Relative references in copied formulas move with the
    /// formula, absolute ones stay pinned, and references pushed off the
    /// grid become `#REF!`. Destination cells that would fall beyond the
    /// grid are skipped.
    ///
    /// Only stored cells are visited, so huge rectangles over a sparse
    /// sheet are cheap.
    pub fn copy_rect(&mut self, dst: CellAddress, src: CellAddress, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let mut staged: Vec<(CellAddress, Cell)> = Vec::new();
        for (from, cell) in self.cells.iter_range(src, far_corner(src, width, height)) {
            let i = i64::from(from.row - src.row);
            let j = i64::from(from.col - src.col);
            let Some(to) = dst.offset(i, j) else {
                continue;
            };

            let cell = match cell {
                Cell::Formula(formula) => Cell::Formula(FormulaCell {
                    expr: formula.expr.rebased(to),
                    source: None,
                }),
                other => other.clone(),
            };
            staged.push((to, cell));
        }

        // Everything in the destination goes; staged cells then land on top
        let stale: Vec<CellAddress> = self
            .cells
            .iter_range(dst, far_corner(dst, width, height))
            .map(|(addr, _)| addr)
            .collect();
        let cleared = stale.len();
        for addr in stale {
            self.cells.remove(addr);
        }

        let written = staged.len();
        for (addr, cell) in staged {
            self.cells.insert(addr, cell);
        }

        log::trace!(
            "copy {}x{} {} -> {}: {} written, {} cleared",
            width,
            height,
            src,
            dst,
            written,
            cleared
        );
    }
}

/// Bottom-right cell of a rectangle, clamped to the grid
fn far_corner(top_left: CellAddress, width: u32, height: u32) -> CellAddress {
    CellAddress::new(
        top_left.row.saturating_add(height - 1),
        top_left.col.saturating_add(width - 1),
    )
}
