//! Formula parser
//!
//! A recursive descent parser with operator precedence. It does not build
//! a tree itself: it reports the formula to an [`ExprBuilder`] in postfix
//! order.

use crate::ast::FormulaExpr;
use crate::builder::{AstBuilder, ExprBuilder};
use crate::error::{FormulaError, FormulaResult};
use tabula_core::CellAddress;

/// Deepest nesting of parentheses and prefix signs the parser accepts
pub const MAX_NESTING: u32 = 256;

/// Parse a formula into an AST for the cell at `home`
///
/// # Example
/// ```rust
/// use tabula_core::CellAddress;
/// use tabula_formula::parse_formula;
///
/// let home = CellAddress::parse("A3").unwrap();
/// let ast = parse_formula("=A1+A2", home).unwrap();
/// assert_eq!(ast.to_formula_string(home), "=A1+A2");
/// ```
pub fn parse_formula(formula: &str, home: CellAddress) -> FormulaResult<FormulaExpr> {
    let mut builder = AstBuilder::new(home);
    parse_formula_with(formula, &mut builder)?;
    builder.finish()
}

/// Parse a formula and drive `builder` with what was found
pub fn parse_formula_with<B: ExprBuilder + ?Sized>(
    formula: &str,
    builder: &mut B,
) -> FormulaResult<()> {
    // Formula must start with '='
    let body = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    let mut parser = FormulaParser::new(body, builder)?;
    parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current != Token::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current
        )));
    }

    Ok(())
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),

    // References
    CellRef(String), // Cell reference like A1, $A$1
    RefError,        // #REF!

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a, B: ?Sized> {
    input: &'a str,
    pos: usize,
    current: Token,
    depth: u32,
    builder: &'a mut B,
}

impl<'a, B: ExprBuilder + ?Sized> FormulaParser<'a, B> {
    fn new(input: &'a str, builder: &'a mut B) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current: Token::Eof,
            depth: 0,
            builder,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.current = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '=' => Some(Token::Equal),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '#' {
            return self.scan_error_literal();
        }

        if c.is_ascii_alphabetic() || c == '$' {
            return self.scan_reference();
        }

        Err(FormulaError::Parse(format!(
            "Unexpected character '{}' at offset {}",
            c, self.pos
        )))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    // Check for escaped quote ("")
                    if self.peek_char_at(1) == Some('"') {
                        s.push('"');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance(); // Skip closing quote
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(FormulaError::Parse(format!(
                        "Unterminated string starting at offset {}",
                        start
                    )))
                }
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    fn scan_error_literal(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance();
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '!' || c == '/')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        if text.eq_ignore_ascii_case("#REF!") {
            Ok(Token::RefError)
        } else {
            Err(FormulaError::Parse(format!("Unsupported literal '{}'", text)))
        }
    }

    fn scan_reference(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '$')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        if Self::is_cell_reference(text) {
            return Ok(Token::CellRef(text.to_string()));
        }

        Err(FormulaError::Parse(format!(
            "'{}' is not a cell reference (functions and names are not supported)",
            text
        )))
    }

    fn is_cell_reference(text: &str) -> bool {
        // Cell reference pattern: [$]letters[$]digits
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        // Skip leading $
        if chars.get(i) == Some(&'$') {
            i += 1;
        }

        // Must have letters
        let letter_start = i;
        while i < chars.len() && chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == letter_start {
            return false;
        }

        // Skip optional $
        if chars.get(i) == Some(&'$') {
            i += 1;
        }

        // Must have digits
        let digit_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == digit_start {
            return false;
        }

        // Must have consumed everything
        i == chars.len()
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if &self.current == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected, self.current
            )))
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested(&mut self, parse: fn(&mut Self) -> FormulaResult<()>) -> FormulaResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::Parse(format!(
                "Formula nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Unary: -, +
    // 5. Exponentiation: ^ (left associative, exponent may carry a sign)
    // 6. Primary: literals, references, parentheses

    fn parse_expression(&mut self) -> FormulaResult<()> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<()> {
        self.parse_additive()?;

        loop {
            let op: fn(&mut B) -> FormulaResult<()> = match self.current {
                Token::Equal => B::op_eq,
                Token::NotEqual => B::op_ne,
                Token::LessThan => B::op_lt,
                Token::LessEqual => B::op_le,
                Token::GreaterThan => B::op_gt,
                Token::GreaterEqual => B::op_ge,
                _ => break,
            };

            self.consume()?;
            self.parse_additive()?;
            op(self.builder)?;
        }

        Ok(())
    }

    fn parse_additive(&mut self) -> FormulaResult<()> {
        self.parse_multiplicative()?;

        loop {
            let op: fn(&mut B) -> FormulaResult<()> = match self.current {
                Token::Plus => B::op_add,
                Token::Minus => B::op_sub,
                _ => break,
            };

            self.consume()?;
            self.parse_multiplicative()?;
            op(self.builder)?;
        }

        Ok(())
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<()> {
        self.parse_unary()?;

        loop {
            let op: fn(&mut B) -> FormulaResult<()> = match self.current {
                Token::Star => B::op_mul,
                Token::Slash => B::op_div,
                _ => break,
            };

            self.consume()?;
            self.parse_unary()?;
            op(self.builder)?;
        }

        Ok(())
    }

    fn parse_unary(&mut self) -> FormulaResult<()> {
        match self.current {
            Token::Minus => {
                self.consume()?;
                self.nested(Self::parse_unary)?;
                self.builder.op_neg()
            }
            // Prefix plus (no-op)
            Token::Plus => {
                self.consume()?;
                self.nested(Self::parse_unary)
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> FormulaResult<()> {
        self.parse_primary()?;

        while self.current == Token::Caret {
            self.consume()?;
            self.parse_signed_primary()?;
            self.builder.op_pow()?;
        }

        Ok(())
    }

    fn parse_signed_primary(&mut self) -> FormulaResult<()> {
        match self.current {
            Token::Minus => {
                self.consume()?;
                self.nested(Self::parse_signed_primary)?;
                self.builder.op_neg()
            }
            Token::Plus => {
                self.consume()?;
                self.nested(Self::parse_signed_primary)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<()> {
        match self.consume()? {
            Token::Number(n) => self.builder.val_number(n),
            Token::String(s) => self.builder.val_string(s),
            Token::CellRef(text) => self.builder.val_reference(&text),
            Token::RefError => self.builder.val_ref_error(),
            Token::LeftParen => {
                self.nested(Self::parse_expression)?;
                self.expect(&Token::RightParen)
            }
            Token::Eof => Err(FormulaError::Parse("Unexpected end of formula".into())),
            token => Err(FormulaError::Parse(format!("Unexpected token: {:?}", token))),
        }
    }
}
