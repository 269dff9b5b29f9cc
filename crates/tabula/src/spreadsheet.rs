//! The spreadsheet: a sparse store of cells plus evaluation on read

use crate::persist::MAX_PAYLOAD_LEN;
use lazy_regex::regex_is_match;
use tabula_core::{CellAddress, CellStorage, CellValue, Error, Result};
use tabula_formula::{
    evaluate, parse_formula, CellSource, EvalBudget, FormulaExpr, SourceCell,
    DEFAULT_MAX_DEPTH, DEFAULT_STEP_BUDGET,
};

/// Content stored in a cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Numeric literal
    Number(f64),
    /// Text literal, stored verbatim
    Text(String),
    /// Formula, evaluated whenever the cell is read
    Formula(FormulaCell),
}

impl Cell {
    /// Short name of the content kind, for listings
    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Number(_) => "number",
            Cell::Text(_) => "text",
            Cell::Formula(_) => "formula",
        }
    }
}

/// A parsed formula and the text it was entered as
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCell {
    /// The AST, with references relative to the cell it lives in
    pub expr: FormulaExpr,
    /// Text as entered; `None` once the formula has been copied elsewhere
    pub source: Option<String>,
}

impl FormulaCell {
    /// Formula text as seen from `home`
    pub fn text(&self, home: CellAddress) -> String {
        match &self.source {
            Some(source) => source.clone(),
            None => self.expr.to_formula_string(home),
        }
    }
}

/// Options for formula evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Reference resolutions allowed while reading one cell
    pub step_budget: u32,
    /// Deepest evaluation recursion, counting nested operators and
    /// formula-to-formula references
    pub max_depth: u32,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A single sheet of cells
///
/// # Example
///
/// ```rust
/// use tabula::{CellValue, Spreadsheet};
///
/// let mut sheet = Spreadsheet::new();
/// sheet.set("A1", "10").unwrap();
/// sheet.set("A2", "20.5").unwrap();
/// sheet.set("A3", "=A1+A2").unwrap();
/// assert_eq!(sheet.get("A3").unwrap(), CellValue::Number(30.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Spreadsheet {
    pub(crate) cells: CellStorage<Cell>,
    options: EvaluationOptions,
}

impl Spreadsheet {
    /// Create an empty spreadsheet with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty spreadsheet with the given evaluation options
    pub fn with_options(options: EvaluationOptions) -> Self {
        Self {
            cells: CellStorage::new(),
            options,
        }
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EvaluationOptions) {
        self.options = options;
    }

    // === Cell Modification ===

    /// Set a cell from user text
    ///
    /// A complete numeric literal becomes a number, text starting with `=`
    /// is parsed as a formula, anything else is stored as text. A formula
    /// that does not parse, or content longer than [`MAX_PAYLOAD_LEN`]
    /// bytes, is an error and leaves the cell unchanged.
    pub fn set_cell(&mut self, addr: CellAddress, text: &str) -> Result<()> {
        let cell = Self::classify(addr, text)?;
        self.cells.insert(addr, cell);
        Ok(())
    }

    /// Set a cell by address string
    pub fn set(&mut self, address: &str, text: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell(addr, text)
    }

    /// Set a cell by 0-based row and column indices
    pub fn set_cell_at(&mut self, row: u32, col: u32, text: &str) -> Result<()> {
        self.set_cell(CellAddress::new(row, col), text)
    }

    fn classify(addr: CellAddress, text: &str) -> Result<Cell> {
        if text.len() as u64 > MAX_PAYLOAD_LEN {
            return Err(Error::ContentTooLong {
                len: text.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        if regex_is_match!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$", text) {
            if let Ok(n) = text.parse::<f64>() {
                return Ok(Cell::Number(n));
            }
        }

        if text.starts_with('=') {
            let expr = parse_formula(text, addr)?;
            return Ok(Cell::Formula(FormulaCell {
                expr,
                source: Some(text.to_string()),
            }));
        }

        Ok(Cell::Text(text.to_string()))
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, addr: CellAddress) -> Option<Cell> {
        self.cells.remove(addr)
    }

    /// Remove every cell
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    // === Cell Access ===

    /// The value of a cell, evaluating formulas
    pub fn get_value(&self, addr: CellAddress) -> CellValue {
        match self.cells.get(addr) {
            None => CellValue::Empty,
            Some(Cell::Number(n)) => CellValue::Number(*n),
            Some(Cell::Text(s)) => CellValue::Text(s.clone()),
            Some(Cell::Formula(formula)) => {
                let mut budget = EvalBudget::new(self.options.step_budget, self.options.max_depth);
                evaluate(&formula.expr, self, addr, &mut budget)
            }
        }
    }

    /// Get a cell value by address string
    pub fn get(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value(addr))
    }

    /// The stored content of a cell
    pub fn cell(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(addr)
    }

    /// Formula text of a formula cell
    ///
    /// Copied formulas have their text regenerated for the new location.
    pub fn formula_text(&self, addr: CellAddress) -> Option<String> {
        match self.cells.get(addr)? {
            Cell::Formula(formula) => Some(formula.text(addr)),
            _ => None,
        }
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells.iter()
    }
}

impl CellSource for Spreadsheet {
    fn cell(&self, addr: CellAddress) -> Option<SourceCell<'_>> {
        self.cells.get(addr).map(|cell| match cell {
            Cell::Number(n) => SourceCell::Number(*n),
            Cell::Text(s) => SourceCell::Text(s),
            Cell::Formula(formula) => SourceCell::Formula(&formula.expr),
        })
    }
}
