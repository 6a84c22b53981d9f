//! Discount formula evaluation
//!
//! Discount rules store their adjustment as a small arithmetic expression over
//! a single placeholder, `@`, which stands for the undiscounted charge.
//! Formulas are entered by administrators in either German or international
//! notation, so a decimal comma is accepted in place of a decimal point.
//!
//! Supported syntax: decimal literals, `@`, binary `+ - * /` (also `− × ÷`),
//! parentheses and unary sign. Evaluation is exact decimal arithmetic.
//!
//! ```rust,ignore
//! let formula = Formula::parse("@ * 0,1")?;
//! assert_eq!(formula.evaluate(dec!(62.50))?, dec!(6.250));
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{BillingError, BillingResult};

/// The placeholder for the undiscounted amount
pub const PLACEHOLDER: char = '@';

const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Placeholder,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Placeholder,
    Negate(Box<Expr>),
    Binary(Box<Expr>, Operator, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A parsed discount formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    raw: String,
    expr: Expr,
}

impl Formula {
    /// Parses a formula, normalizing decimal commas to points
    pub fn parse(raw: &str) -> BillingResult<Self> {
        let normalized = raw.replace(',', ".");
        let tokens = tokenize(&normalized).map_err(|reason| BillingError::formula(raw, reason))?;
        let mut parser = Parser { tokens: &tokens, position: 0 };
        let expr = parser
            .parse_expression(0)
            .map_err(|reason| BillingError::formula(raw, reason))?;
        if let Some(token) = parser.peek() {
            return Err(BillingError::formula(
                raw,
                format!("unexpected {} after end of expression", describe(token)),
            ));
        }
        Ok(Self {
            raw: raw.to_string(),
            expr,
        })
    }

    /// Returns the formula as stored
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Evaluates the formula with `@` bound to `value`
    pub fn evaluate(&self, value: Decimal) -> BillingResult<Decimal> {
        eval(&self.expr, value).map_err(|reason| BillingError::formula(&self.raw, reason))
    }
}

/// Parses and evaluates a formula in one step
pub fn evaluate(raw: &str, value: Decimal) -> BillingResult<Decimal> {
    Formula::parse(raw)?.evaluate(value)
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            PLACEHOLDER => Token::Placeholder,
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        end = index + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let number = Decimal::from_str(literal)
                    .map_err(|_| format!("invalid number '{}'", literal))?;
                Token::Number(number)
            }
            other => return Err(format!("unexpected character '{}'", other)),
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err("formula is empty".to_string());
    }
    Ok(tokens)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Placeholder => format!("'{}'", PLACEHOLDER),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

// Every operator, parenthesis and sign deepens the tree `eval` walks
fn descend(depth: usize) -> Result<usize, String> {
    if depth >= MAX_NESTING {
        return Err("expression is nested too deeply".to_string());
    }
    Ok(depth + 1)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    // expression := term (('+' | '-') term)*
    fn parse_expression(&mut self, mut depth: usize) -> Result<Expr, String> {
        let mut left = self.parse_term(depth)?;
        while let Some(op) = self.peek().and_then(|token| match token {
            Token::Plus => Some(Operator::Add),
            Token::Minus => Some(Operator::Subtract),
            _ => None,
        }) {
            self.advance();
            depth = descend(depth)?;
            let right = self.parse_term(depth)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // term := factor (('*' | '/') factor)*
    fn parse_term(&mut self, mut depth: usize) -> Result<Expr, String> {
        let mut left = self.parse_factor(depth)?;
        while let Some(op) = self.peek().and_then(|token| match token {
            Token::Star => Some(Operator::Multiply),
            Token::Slash => Some(Operator::Divide),
            _ => None,
        }) {
            self.advance();
            depth = descend(depth)?;
            let right = self.parse_factor(depth)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // factor := ('+' | '-') factor | number | '@' | '(' expression ')'
    fn parse_factor(&mut self, depth: usize) -> Result<Expr, String> {
        descend(depth)?;
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::Placeholder) => Ok(Expr::Placeholder),
            Some(Token::Plus) => self.parse_factor(depth + 1),
            Some(Token::Minus) => Ok(Expr::Negate(Box::new(self.parse_factor(depth + 1)?))),
            Some(Token::LParen) => {
                let inner = self.parse_expression(depth + 1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(format!("expected ')' but found {}", describe(token))),
                    None => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(token) => Err(format!("unexpected {}", describe(token))),
            None => Err("unexpected end of formula".to_string()),
        }
    }
}

fn eval(expr: &Expr, value: Decimal) -> Result<Decimal, String> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Placeholder => Ok(value),
        Expr::Negate(inner) => Ok(-eval(inner, value)?),
        Expr::Binary(left, op, right) => {
            let left = eval(left, value)?;
            let right = eval(right, value)?;
            let result = match op {
                Operator::Add => left.checked_add(right),
                Operator::Subtract => left.checked_sub(right),
                Operator::Multiply => left.checked_mul(right),
                Operator::Divide => {
                    if right.is_zero() {
                        return Err("division by zero".to_string());
                    }
                    left.checked_div(right)
                }
            };
            result.ok_or_else(|| "arithmetic overflow".to_string())
        }
    }
}
