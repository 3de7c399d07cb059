//! Recursive-descent parser for the arithmetic formula language.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := '-' factor | primary
//! primary := number | cellref | '(' expr ')'
//! ```

use thiserror::Error;

use crate::ast::Expr;
use crate::lexer::{tokenize, LexError, Token};

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("empty formula")]
    Empty,
    #[error("trailing input after a complete expression")]
    TrailingInput,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

/// Parse formula text (without the leading `=`) into an expression tree.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::TrailingInput);
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.parse_factor()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::Ref(pos)) => Ok(Expr::Ref(*pos)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError::UnbalancedParens),
                }
            }
            Some(_) => Err(ParseError::UnexpectedToken(self.pos - 1)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_types::Position;

    #[test]
    fn parses_precedence_correctly() {
        // 1+2*3 -> Add(1, Mul(2, 3))
        let expr = parse("1+2*3").unwrap();
        assert_eq!(
            expr,
            Expr::Add(
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Mul(Box::new(Expr::Number(2.0)), Box::new(Expr::Number(3.0)))),
            )
        );
    }

    #[test]
    fn parses_parenthesized_grouping() {
        let expr = parse("(1+2)*3").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(
                Box::new(Expr::Add(Box::new(Expr::Number(1.0)), Box::new(Expr::Number(2.0)))),
                Box::new(Expr::Number(3.0)),
            )
        );
    }

    #[test]
    fn parses_unary_minus() {
        let expr = parse("-A1+2").unwrap();
        assert_eq!(
            expr,
            Expr::Add(
                Box::new(Expr::Neg(Box::new(Expr::Ref(Position::new(0, 0))))),
                Box::new(Expr::Number(2.0)),
            )
        );
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert_eq!(parse("(1+2"), Err(ParseError::UnbalancedParens));
    }

    #[test]
    fn rejects_empty_formula() {
        assert_eq!(parse(""), Err(ParseError::Empty));
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert_eq!(parse("1 2"), Err(ParseError::TrailingInput));
    }

    #[test]
    fn rejects_dangling_operator() {
        assert_eq!(parse("1+"), Err(ParseError::UnexpectedEnd));
    }
}
