//! Formula Abstract Syntax Tree types
//!
//! References are stored relative to the formula's home cell, so the same
//! tree is valid wherever the formula lives. Text is derived from the tree
//! on demand with [`FormulaExpr::to_formula_string`].

use crate::error::{FormulaError, FormulaResult};
use tabula_core::CellAddress;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    Text(String),

    // === References ===
    /// Single cell reference
    Reference(CellReference),
    /// A reference that was moved off the grid by a copy (`#REF!`)
    RefError,

    // === Operators ===
    /// Unary negation
    Negate(Box<FormulaExpr>),
    /// Arithmetic operation
    Arithmetic {
        op: ArithmeticOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Comparison, yields 1 or 0
    Compare {
        op: CompareOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl ArithmeticOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Subtract => "-",
            ArithmeticOperator::Multiply => "*",
            ArithmeticOperator::Divide => "/",
            ArithmeticOperator::Power => "^",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl CompareOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOperator::Equal => "=",
            CompareOperator::NotEqual => "<>",
            CompareOperator::LessThan => "<",
            CompareOperator::LessEqual => "<=",
            CompareOperator::GreaterThan => ">",
            CompareOperator::GreaterEqual => ">=",
        }
    }

    /// Apply the comparison
    pub fn test<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            CompareOperator::Equal => left == right,
            CompareOperator::NotEqual => left != right,
            CompareOperator::LessThan => left < right,
            CompareOperator::LessEqual => left <= right,
            CompareOperator::GreaterThan => left > right,
            CompareOperator::GreaterEqual => left >= right,
        }
    }
}

/// One axis of a cell reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAxis {
    /// Offset from the home cell; moves when the formula is copied
    Relative(i64),
    /// Fixed index (`$` in text); pinned under copy
    Absolute(u32),
}

impl RefAxis {
    /// Resolve against the home cell's index on this axis
    pub fn resolve(self, home: u32) -> Option<u32> {
        match self {
            RefAxis::Relative(offset) => u32::try_from(home as i64 + offset).ok(),
            RefAxis::Absolute(index) => Some(index),
        }
    }

    fn new(absolute: bool, target: u32, home: u32) -> Self {
        if absolute {
            RefAxis::Absolute(target)
        } else {
            RefAxis::Relative(target as i64 - home as i64)
        }
    }

    pub fn is_absolute(self) -> bool {
        matches!(self, RefAxis::Absolute(_))
    }
}

/// A single cell reference such as `B3`, `$B3`, `B$3` or `$B$3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReference {
    pub row: RefAxis,
    pub col: RefAxis,
}

impl CellReference {
    pub fn new(row: RefAxis, col: RefAxis) -> Self {
        Self { row, col }
    }

    /// Parse reference text written in the cell at `home`.
    ///
    /// A leading `$` pins the column, a `$` between letters and digits
    /// pins the row.
    pub fn parse(text: &str, home: CellAddress) -> FormulaResult<Self> {
        let (col_absolute, rest) = match text.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let letters_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(letters_end);

        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };

        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FormulaError::InvalidReference(format!(
                "'{}' is not [$]COLUMN[$]ROW",
                text
            )));
        }

        let target = CellAddress::parse(&format!("{}{}", letters, digits))
            .map_err(|e| FormulaError::InvalidReference(format!("'{}': {}", text, e)))?;

        Ok(Self {
            row: RefAxis::new(row_absolute, target.row, home.row),
            col: RefAxis::new(col_absolute, target.col, home.col),
        })
    }

    /// The cell this reference points at from `home`, if it is on the grid
    pub fn resolve(&self, home: CellAddress) -> Option<CellAddress> {
        Some(CellAddress::new(
            self.row.resolve(home.row)?,
            self.col.resolve(home.col)?,
        ))
    }

    /// Render as A1 text from `home`, or `None` if off the grid
    pub fn to_a1_string(&self, home: CellAddress) -> Option<String> {
        let target = self.resolve(home)?;
        let mut out = String::new();
        if self.col.is_absolute() {
            out.push('$');
        }
        out.push_str(&CellAddress::column_to_letters(target.col));
        if self.row.is_absolute() {
            out.push('$');
        }
        out.push_str(&(target.row as u64 + 1).to_string());
        Some(out)
    }
}

// Binding strength used when rendering; mirrors the parser's grammar.
const PREC_COMPARE: u8 = 1;
const PREC_ADDITIVE: u8 = 2;
const PREC_MULTIPLICATIVE: u8 = 3;
const PREC_UNARY: u8 = 4;
const PREC_POWER: u8 = 5;
const PREC_PRIMARY: u8 = 6;

impl FormulaExpr {
    pub fn negate(operand: FormulaExpr) -> Self {
        FormulaExpr::Negate(Box::new(operand))
    }

    pub fn arithmetic(op: ArithmeticOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: CompareOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Clone this formula for a new home cell.
    ///
    /// Relative references keep their offsets, so their targets move with
    /// the formula; absolute axes stay pinned. References that would leave
    /// the grid from `new_home` become [`FormulaExpr::RefError`].
    pub fn rebased(&self, new_home: CellAddress) -> FormulaExpr {
        match self {
            FormulaExpr::Reference(reference) => match reference.resolve(new_home) {
                Some(_) => FormulaExpr::Reference(*reference),
                None => FormulaExpr::RefError,
            },
            FormulaExpr::Number(_) | FormulaExpr::Text(_) | FormulaExpr::RefError => self.clone(),
            FormulaExpr::Negate(operand) => FormulaExpr::negate(operand.rebased(new_home)),
            FormulaExpr::Arithmetic { op, left, right } => {
                FormulaExpr::arithmetic(*op, left.rebased(new_home), right.rebased(new_home))
            }
            FormulaExpr::Compare { op, left, right } => {
                FormulaExpr::compare(*op, left.rebased(new_home), right.rebased(new_home))
            }
        }
    }

    /// Render formula text (with the leading `=`) as seen from `home`.
    ///
    /// The text parses back to an equivalent tree.
    pub fn to_formula_string(&self, home: CellAddress) -> String {
        let mut out = String::from("=");
        self.write_expr(&mut out, home);
        out
    }

    fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::Number(n) if n.is_sign_negative() && !n.is_nan() => PREC_UNARY,
            FormulaExpr::Number(_)
            | FormulaExpr::Text(_)
            | FormulaExpr::Reference(_)
            | FormulaExpr::RefError => PREC_PRIMARY,
            FormulaExpr::Negate(_) => PREC_UNARY,
            FormulaExpr::Arithmetic { op, .. } => match op {
                ArithmeticOperator::Add | ArithmeticOperator::Subtract => PREC_ADDITIVE,
                ArithmeticOperator::Multiply | ArithmeticOperator::Divide => PREC_MULTIPLICATIVE,
                ArithmeticOperator::Power => PREC_POWER,
            },
            FormulaExpr::Compare { .. } => PREC_COMPARE,
        }
    }

    fn write_operand(&self, out: &mut String, home: CellAddress, min_prec: u8) {
        if self.precedence() < min_prec {
            out.push('(');
            self.write_expr(out, home);
            out.push(')');
        } else {
            self.write_expr(out, home);
        }
    }

    fn write_expr(&self, out: &mut String, home: CellAddress) {
        match self {
            FormulaExpr::Number(n) => out.push_str(&number_literal(*n)),
            FormulaExpr::Text(s) => {
                out.push('"');
                out.push_str(&s.replace('"', "\"\""));
                out.push('"');
            }
            FormulaExpr::Reference(reference) => match reference.to_a1_string(home) {
                Some(text) => out.push_str(&text),
                None => out.push_str("#REF!"),
            },
            FormulaExpr::RefError => out.push_str("#REF!"),
            FormulaExpr::Negate(operand) => {
                out.push('-');
                operand.write_operand(out, home, PREC_UNARY);
            }
            FormulaExpr::Arithmetic { op, left, right } => {
                let prec = self.precedence();
                // Left-associative everywhere; the exponent must be a primary.
                let right_prec = if *op == ArithmeticOperator::Power {
                    PREC_PRIMARY
                } else {
                    prec + 1
                };
                left.write_operand(out, home, prec);
                out.push_str(op.symbol());
                right.write_operand(out, home, right_prec);
            }
            FormulaExpr::Compare { op, left, right } => {
                left.write_operand(out, home, PREC_COMPARE);
                out.push_str(op.symbol());
                right.write_operand(out, home, PREC_COMPARE + 1);
            }
        }
    }
}

/// Number literal text that the tokenizer reads back to the same value
fn number_literal(n: f64) -> String {
    if n.is_nan() {
        return "(1e999-1e999)".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "1e999" } else { "-1e999" }.to_string();
    }
    let abs = n.abs();
    if abs != 0.0 && !(1e-6..1e16).contains(&abs) {
        format!("{:e}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(text: &str) -> CellAddress {
        CellAddress::parse(text).unwrap()
    }

    fn rel(text: &str, home: &str) -> FormulaExpr {
        FormulaExpr::Reference(CellReference::parse(text, addr(home)).unwrap())
    }

    #[test]
    fn test_reference_parse_relative() {
        let reference = CellReference::parse("D1", addr("F11")).unwrap();
        assert_eq!(reference.row, RefAxis::Relative(-10));
        assert_eq!(reference.col, RefAxis::Relative(-2));
        assert_eq!(reference.resolve(addr("F11")), Some(addr("D1")));
        assert_eq!(reference.resolve(addr("G12")), Some(addr("E2")));
    }

    #[test]
    fn test_reference_parse_absolute_flags() {
        let home = addr("C3");

        let reference = CellReference::parse("$A1", home).unwrap();
        assert_eq!(reference.col, RefAxis::Absolute(0));
        assert_eq!(reference.row, RefAxis::Relative(-2));

        let reference = CellReference::parse("A$1", home).unwrap();
        assert_eq!(reference.col, RefAxis::Relative(-2));
        assert_eq!(reference.row, RefAxis::Absolute(0));

        let reference = CellReference::parse("$a$1", home).unwrap();
        assert_eq!(reference, CellReference::new(RefAxis::Absolute(0), RefAxis::Absolute(0)));
    }

    #[test]
    fn test_reference_parse_errors() {
        let home = addr("A1");
        assert!(CellReference::parse("A0", home).is_err());
        assert!(CellReference::parse("$$A1", home).is_err());
        assert!(CellReference::parse("A1$", home).is_err());
        assert!(matches!(
            CellReference::parse("1A", home),
            Err(FormulaError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_reference_to_a1_string() {
        let home = addr("B2");
        for text in ["A1", "$A1", "A$1", "$A$1", "AA100"] {
            let reference = CellReference::parse(text, home).unwrap();
            assert_eq!(reference.to_a1_string(home).unwrap(), text);
        }

        let reference = CellReference::parse("A1", home).unwrap();
        assert_eq!(reference.to_a1_string(addr("A1")), None);
    }

    #[test]
    fn test_rebased_moves_relative_and_pins_absolute() {
        let home = addr("F11");
        let expr = FormulaExpr::arithmetic(
            ArithmeticOperator::Add,
            FormulaExpr::Reference(CellReference::parse("$D1", home).unwrap()),
            rel("D$1", "F11"),
        );

        let copied = expr.rebased(addr("G12"));
        assert_eq!(copied.to_formula_string(addr("G12")), "=$D2+E$1");
    }

    #[test]
    fn test_rebased_off_grid_becomes_ref_error() {
        let expr = rel("A1", "B2");
        assert_eq!(expr.rebased(addr("A1")), FormulaExpr::RefError);
        assert_eq!(expr.rebased(addr("C3")), expr);

        let absolute = FormulaExpr::Reference(CellReference::parse("$A$1", addr("B2")).unwrap());
        assert_eq!(absolute.rebased(addr("A1")), absolute);
    }

    #[test]
    fn test_render_parenthesizes_by_precedence() {
        let home = addr("A1");
        let sum = FormulaExpr::arithmetic(
            ArithmeticOperator::Add,
            FormulaExpr::Number(1.0),
            FormulaExpr::Number(2.0),
        );
        let product = FormulaExpr::arithmetic(
            ArithmeticOperator::Multiply,
            sum.clone(),
            FormulaExpr::Number(3.0),
        );
        assert_eq!(product.to_formula_string(home), "=(1+2)*3");

        let difference = FormulaExpr::arithmetic(
            ArithmeticOperator::Subtract,
            FormulaExpr::Number(1.0),
            sum,
        );
        assert_eq!(difference.to_formula_string(home), "=1-(1+2)");

        let power = FormulaExpr::arithmetic(
            ArithmeticOperator::Power,
            FormulaExpr::Number(-2.0),
            FormulaExpr::negate(FormulaExpr::Number(1.0)),
        );
        assert_eq!(power.to_formula_string(home), "=(-2)^(-1)");

        let negated_power = FormulaExpr::negate(FormulaExpr::arithmetic(
            ArithmeticOperator::Power,
            FormulaExpr::Number(2.0),
            FormulaExpr::Number(2.0),
        ));
        assert_eq!(negated_power.to_formula_string(home), "=-2^2");
    }

    #[test]
    fn test_render_strings_and_errors() {
        let home = addr("A1");
        let expr = FormulaExpr::compare(
            CompareOperator::NotEqual,
            FormulaExpr::Text("say \"hi\"".into()),
            FormulaExpr::RefError,
        );
        assert_eq!(expr.to_formula_string(home), "=\"say \"\"hi\"\"\"<>#REF!");
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal(5.0), "5");
        assert_eq!(number_literal(0.25), "0.25");
        assert_eq!(number_literal(1e300), "1e300");
        assert_eq!(number_literal(f64::INFINITY), "1e999");
        assert_eq!(number_literal(1.5e-7).parse::<f64>().unwrap(), 1.5e-7);
    }
}
