//! Builder contract driven by the formula parser
//!
//! The parser reports a formula in postfix order: operands are pushed with
//! the `val_*` calls, operators pop their operands and push the result.
//! [`AstBuilder`] is the implementation that produces a [`FormulaExpr`].

use crate::ast::{ArithmeticOperator, CellReference, CompareOperator, FormulaExpr};
use crate::error::{FormulaError, FormulaResult};
use tabula_core::CellAddress;

/// Deepest expression tree [`AstBuilder`] will build
pub const MAX_EXPR_DEPTH: u32 = 512;

/// Receiver of parser events, in postfix order
pub trait ExprBuilder {
    /// Numeric literal
    fn val_number(&mut self, value: f64) -> FormulaResult<()>;
    /// String literal (quotes already removed and unescaped)
    fn val_string(&mut self, value: String) -> FormulaResult<()>;
    /// Cell reference text, e.g. `B3`, `$B$3`
    fn val_reference(&mut self, reference: &str) -> FormulaResult<()>;
    /// `#REF!` literal
    fn val_ref_error(&mut self) -> FormulaResult<()>;

    /// Unary minus
    fn op_neg(&mut self) -> FormulaResult<()>;

    fn op_add(&mut self) -> FormulaResult<()>;
    fn op_sub(&mut self) -> FormulaResult<()>;
    fn op_mul(&mut self) -> FormulaResult<()>;
    fn op_div(&mut self) -> FormulaResult<()>;
    fn op_pow(&mut self) -> FormulaResult<()>;

    fn op_eq(&mut self) -> FormulaResult<()>;
    fn op_ne(&mut self) -> FormulaResult<()>;
    fn op_lt(&mut self) -> FormulaResult<()>;
    fn op_le(&mut self) -> FormulaResult<()>;
    fn op_gt(&mut self) -> FormulaResult<()>;
    fn op_ge(&mut self) -> FormulaResult<()>;
}

/// Builds a [`FormulaExpr`] for a formula living in the cell `home`
#[derive(Debug)]
pub struct AstBuilder {
    home: CellAddress,
    /// Finished subexpressions with their tree depth
    stack: Vec<(FormulaExpr, u32)>,
}

impl AstBuilder {
    pub fn new(home: CellAddress) -> Self {
        Self {
            home,
            stack: Vec::new(),
        }
    }

    /// Take the finished expression.
    ///
    /// Fails unless exactly one expression is left on the stack.
    pub fn finish(mut self) -> FormulaResult<FormulaExpr> {
        match (self.stack.pop(), self.stack.is_empty()) {
            (Some((expr, _)), true) => Ok(expr),
            (None, _) => Err(FormulaError::Parse("empty expression".into())),
            (Some(_), false) => Err(FormulaError::Parse(format!(
                "{} operands left without an operator",
                self.stack.len() + 1
            ))),
        }
    }

    fn pop(&mut self, op: &str) -> FormulaResult<(FormulaExpr, u32)> {
        self.stack
            .pop()
            .ok_or_else(|| FormulaError::Parse(format!("missing operand for '{}'", op)))
    }

    fn leaf(&mut self, expr: FormulaExpr) -> FormulaResult<()> {
        self.stack.push((expr, 1));
        Ok(())
    }

    /// Push an operator node sitting above a subtree `child_depth` deep
    fn node(&mut self, expr: FormulaExpr, child_depth: u32) -> FormulaResult<()> {
        let depth = child_depth + 1;
        if depth > MAX_EXPR_DEPTH {
            return Err(FormulaError::Parse(format!(
                "Formula nested deeper than {} levels",
                MAX_EXPR_DEPTH
            )));
        }
        self.stack.push((expr, depth));
        Ok(())
    }

    fn arithmetic(&mut self, op: ArithmeticOperator) -> FormulaResult<()> {
        let (right, right_depth) = self.pop(op.symbol())?;
        let (left, left_depth) = self.pop(op.symbol())?;
        self.node(
            FormulaExpr::arithmetic(op, left, right),
            left_depth.max(right_depth),
        )
    }

    fn compare(&mut self, op: CompareOperator) -> FormulaResult<()> {
        let (right, right_depth) = self.pop(op.symbol())?;
        let (left, left_depth) = self.pop(op.symbol())?;
        self.node(
            FormulaExpr::compare(op, left, right),
            left_depth.max(right_depth),
        )
    }
}

impl ExprBuilder for AstBuilder {
    fn val_number(&mut self, value: f64) -> FormulaResult<()> {
        self.leaf(FormulaExpr::Number(value))
    }

    fn val_string(&mut self, value: String) -> FormulaResult<()> {
        self.leaf(FormulaExpr::Text(value))
    }

    fn val_reference(&mut self, reference: &str) -> FormulaResult<()> {
        let reference = CellReference::parse(reference, self.home)?;
        self.leaf(FormulaExpr::Reference(reference))
    }

    fn val_ref_error(&mut self) -> FormulaResult<()> {
        self.leaf(FormulaExpr::RefError)
    }

    fn op_neg(&mut self) -> FormulaResult<()> {
        let (operand, depth) = self.pop("-")?;
        self.node(FormulaExpr::negate(operand), depth)
    }

    fn op_add(&mut self) -> FormulaResult<()> {
        self.arithmetic(ArithmeticOperator::Add)
    }

    fn op_sub(&mut self) -> FormulaResult<()> {
        self.arithmetic(ArithmeticOperator::Subtract)
    }

    fn op_mul(&mut self) -> FormulaResult<()> {
        self.arithmetic(ArithmeticOperator::Multiply)
    }

    fn op_div(&mut self) -> FormulaResult<()> {
        self.arithmetic(ArithmeticOperator::Divide)
    }

    fn op_pow(&mut self) -> FormulaResult<()> {
        self.arithmetic(ArithmeticOperator::Power)
    }

    fn op_eq(&mut self) -> FormulaResult<()> {
        self.compare(CompareOperator::Equal)
    }

    fn op_ne(&mut self) -> FormulaResult<()> {
        self.compare(CompareOperator::NotEqual)
    }

    fn op_lt(&mut self) -> FormulaResult<()> {
        self.compare(CompareOperator::LessThan)
    }

    fn op_le(&mut self) -> FormulaResult<()> {
        self.compare(CompareOperator::LessEqual)
    }

    fn op_gt(&mut self) -> FormulaResult<()> {
        self.compare(CompareOperator::GreaterThan)
    }

    fn op_ge(&mut self) -> FormulaResult<()> {
        self.compare(CompareOperator::GreaterEqual)
    }
}
