//! Formula evaluator
//!
//! Evaluates formula ASTs against a [`CellSource`]. Evaluation never fails:
//! anything that has no sensible result (type mismatch, division by zero,
//! a reference chain that runs out of budget) yields [`CellValue::Empty`].

use crate::ast::{ArithmeticOperator, CellReference, CompareOperator, FormulaExpr};
use tabula_core::{format_number, CellAddress, CellValue};

/// Reference resolutions allowed per top-level evaluation
pub const DEFAULT_STEP_BUDGET: u32 = 10_000;

/// Deepest evaluation recursion, counting every nested operator and
/// every formula reached through a reference
pub const DEFAULT_MAX_DEPTH: u32 = 1_024;

/// What the evaluator sees of a stored cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceCell<'a> {
    Number(f64),
    Text(&'a str),
    Formula(&'a FormulaExpr),
}

/// Read access to the cells a formula may reference
pub trait CellSource {
    /// The cell stored at `addr`, or `None` if it is empty
    fn cell(&self, addr: CellAddress) -> Option<SourceCell<'_>>;
}

/// Per-evaluation step counter
///
/// One step is charged for every reference that is resolved, and one
/// level of depth for every expression node entered, including the nodes
/// of formulas reached through references. Once either limit is hit the
/// budget is exhausted and stays so: every further reference evaluates to
/// empty. This is what terminates cyclic formulas and keeps evaluation
/// within a bounded stack.
#[derive(Debug, Clone)]
pub struct EvalBudget {
    step_budget: u32,
    max_depth: u32,
    steps: u32,
    depth: u32,
    exhausted: bool,
}

impl Default for EvalBudget {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_BUDGET, DEFAULT_MAX_DEPTH)
    }
}

impl EvalBudget {
    pub fn new(step_budget: u32, max_depth: u32) -> Self {
        Self {
            step_budget,
            max_depth,
            steps: 0,
            depth: 0,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Charge one step for resolving a reference from `home`.
    ///
    /// Returns `false` if the budget is exhausted.
    fn charge(&mut self, home: CellAddress) -> bool {
        if self.exhausted {
            return false;
        }
        self.steps += 1;
        if self.steps > self.step_budget {
            self.exhaust(home);
            return false;
        }
        true
    }

    /// Go one level deeper, or return `false` at the depth limit.
    fn enter(&mut self, home: CellAddress) -> bool {
        if self.depth >= self.max_depth {
            self.exhaust(home);
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn exhaust(&mut self, home: CellAddress) {
        if !self.exhausted {
            log::debug!(
                "evaluation budget exhausted at {} after {} steps (depth {})",
                home,
                self.steps.min(self.step_budget),
                self.depth
            );
            self.exhausted = true;
        }
    }
}

/// Evaluate a formula living in the cell `home`
pub fn evaluate<S: CellSource + ?Sized>(
    expr: &FormulaExpr,
    source: &S,
    home: CellAddress,
    budget: &mut EvalBudget,
) -> CellValue {
    if !budget.enter(home) {
        return CellValue::Empty;
    }

    let value = match expr {
        // === Literals ===
        FormulaExpr::Number(n) => CellValue::Number(*n),
        FormulaExpr::Text(s) => CellValue::Text(s.clone()),

        // === References ===
        FormulaExpr::Reference(reference) => evaluate_reference(reference, source, home, budget),
        FormulaExpr::RefError => CellValue::Empty,

        // === Operators ===
        FormulaExpr::Negate(operand) => match evaluate(operand, source, home, budget) {
            CellValue::Number(n) => CellValue::Number(-n),
            _ => CellValue::Empty,
        },
        FormulaExpr::Arithmetic { op, left, right } => {
            let left = evaluate(left, source, home, budget);
            let right = evaluate(right, source, home, budget);
            evaluate_arithmetic(*op, left, right)
        }
        FormulaExpr::Compare { op, left, right } => {
            let left = evaluate(left, source, home, budget);
            let right = evaluate(right, source, home, budget);
            evaluate_compare(*op, &left, &right)
        }
    };

    budget.leave();
    value
}

fn evaluate_reference<S: CellSource + ?Sized>(
    reference: &CellReference,
    source: &S,
    home: CellAddress,
    budget: &mut EvalBudget,
) -> CellValue {
    if !budget.charge(home) {
        return CellValue::Empty;
    }

    let Some(target) = reference.resolve(home) else {
        return CellValue::Empty;
    };

    match source.cell(target) {
        None => CellValue::Empty,
        Some(SourceCell::Number(n)) => CellValue::Number(n),
        Some(SourceCell::Text(s)) => CellValue::text(s),
        Some(SourceCell::Formula(expr)) => evaluate(expr, source, target, budget),
    }
}

fn evaluate_arithmetic(op: ArithmeticOperator, left: CellValue, right: CellValue) -> CellValue {
    match (op, left, right) {
        (ArithmeticOperator::Add, CellValue::Number(l), CellValue::Number(r)) => {
            CellValue::Number(l + r)
        }
        // Concatenation
        (ArithmeticOperator::Add, CellValue::Text(l), CellValue::Text(r)) => {
            CellValue::Text(l + &r)
        }
        (ArithmeticOperator::Add, CellValue::Text(l), CellValue::Number(r)) => {
            CellValue::Text(l + &format_number(r))
        }
        (ArithmeticOperator::Add, CellValue::Number(l), CellValue::Text(r)) => {
            CellValue::Text(format_number(l) + &r)
        }
        (ArithmeticOperator::Subtract, CellValue::Number(l), CellValue::Number(r)) => {
            CellValue::Number(l - r)
        }
        (ArithmeticOperator::Multiply, CellValue::Number(l), CellValue::Number(r)) => {
            CellValue::Number(l * r)
        }
        (ArithmeticOperator::Divide, CellValue::Number(l), CellValue::Number(r)) => {
            if r == 0.0 {
                CellValue::Empty
            } else {
                CellValue::Number(l / r)
            }
        }
        (ArithmeticOperator::Power, CellValue::Number(l), CellValue::Number(r)) => {
            CellValue::Number(l.powf(r))
        }
        _ => CellValue::Empty,
    }
}

fn evaluate_compare(op: CompareOperator, left: &CellValue, right: &CellValue) -> CellValue {
    let result = match (left, right) {
        (CellValue::Number(l), CellValue::Number(r)) => op.test(l, r),
        // Strings compare bytewise
        (CellValue::Text(l), CellValue::Text(r)) => op.test(l.as_str(), r.as_str()),
        _ => return CellValue::Empty,
    };

    CellValue::Number(if result { 1.0 } else { 0.0 })
}
