//! A minimal arithmetic formula expression language: numbers, cell
//! references, `+ - * /`, unary minus, and parentheses.
//!
//! This is the one concrete implementation of `sheet_types::FormulaParser`
//! shipped in this workspace. The cell graph in `sheet-core` depends only
//! on the trait; this crate is a plug-in, not a dependency the graph needs
//! to understand.

mod ast;
mod lexer;
mod parser;

use sheet_types::{Formula, FormulaError, FormulaParseError, FormulaParser, Position};

pub use ast::Expr;
pub use lexer::{tokenize, LexError, Token};
pub use parser::{parse, ParseError};

/// The default formula parser: arithmetic expressions over cell references.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArithmeticParser;

impl FormulaParser for ArithmeticParser {
    fn parse(&self, text: &str) -> Result<Box<dyn Formula>, FormulaParseError> {
        let expr = parse(text).map_err(|e| FormulaParseError::new(e.to_string()))?;
        Ok(Box::new(CompiledFormula::new(expr)))
    }
}

/// A parsed arithmetic expression, ready to evaluate.
#[derive(Debug)]
pub struct CompiledFormula {
    expr: Expr,
    referenced: Vec<Position>,
    canonical: String,
}

impl CompiledFormula {
    fn new(expr: Expr) -> Self {
        let referenced = expr.referenced_positions();
        let canonical = expr.to_canonical_string();
        CompiledFormula {
            expr,
            referenced,
            canonical,
        }
    }
}

impl Formula for CompiledFormula {
    fn evaluate(
        &self,
        lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        self.expr.evaluate(lookup)
    }

    fn referenced_positions(&self) -> &[Position] {
        &self.referenced
    }

    fn expression(&self) -> &str {
        &self.canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_rejects_invalid_syntax() {
        let parser = ArithmeticParser;
        assert!(parser.parse("1+").is_err());
    }

    #[test]
    fn round_trips_through_canonical_expression() {
        let parser = ArithmeticParser;
        let formula = parser.parse("A1+3").unwrap();
        assert_eq!(formula.expression(), "A1+3");
    }

    #[test]
    fn evaluates_with_injected_lookup() {
        let parser = ArithmeticParser;
        let formula = parser.parse("A1+3").unwrap();
        let mut lookup = |pos: Position| {
            assert_eq!(pos, Position::new(0, 0));
            Ok(2.0)
        };
        assert_eq!(formula.evaluate(&mut lookup), Ok(5.0));
    }

    #[test]
    fn division_by_zero_yields_arithmetic_error() {
        let parser = ArithmeticParser;
        let formula = parser.parse("1/0").unwrap();
        assert_eq!(formula.evaluate(&mut |_| Ok(0.0)), Err(FormulaError::Arithmetic));
    }
}
