//! Restricted arithmetic expression evaluator.
//!
//! Overlay corrections may attach a post-read expression to a property, for
//! example `value / 10` for a firmware that reports tenths of a degree. The
//! evaluator accepts exactly one variable (`value`), numeric literals, the
//! operators `+ - * / %`, unary minus and parentheses. Nothing else parses:
//! no identifiers, no calls, no indexing. Expressions come from bundled
//! correction documents, but they are treated as data, not code.
//!
//! ```
//! use capbridge_core::expr::evaluate;
//!
//! assert_eq!(evaluate("value / 10 + 1", 235.0).unwrap(), 24.5);
//! ```

use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' in expression")]
    UnexpectedChar(char),

    #[error("unknown identifier '{0}', only 'value' is allowed")]
    UnknownIdentifier(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Value,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if ident == "value" {
                    tokens.push(Token::Value);
                } else {
                    return Err(ExprError::UnknownIdentifier(ident));
                }
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    value: f64,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], value: f64) -> Self {
        Self {
            tokens,
            pos: 0,
            value,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut left = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    left += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    left -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, ExprError> {
        let mut left = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    left *= self.unary()?;
                }
                Token::Slash => {
                    self.advance();
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    left /= right;
                }
                Token::Percent => {
                    self.advance();
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    left %= right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// unary := '-' unary | primary
    fn unary(&mut self) -> Result<f64, ExprError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    /// primary := number | 'value' | '(' expr ')'
    fn primary(&mut self) -> Result<f64, ExprError> {
        let pos = self.pos;
        match self.advance() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::Value) => Ok(self.value),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(_) => Err(ExprError::UnexpectedToken(self.pos - 1)),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(_) => Err(ExprError::UnexpectedToken(pos)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

/// Evaluate `source` with the variable `value` bound to `value`.
pub fn evaluate(source: &str, value: f64) -> Result<f64, ExprError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExprError::UnexpectedEnd);
    }
    let mut parser = Parser::new(&tokens, value);
    let result = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(ExprError::UnexpectedToken(parser.pos));
    }
    Ok(result)
}
