//! The parsed expression tree and its evaluator.

use sheet_types::{FormulaError, Position};

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Ref(Position),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate the expression, short-circuiting on the first `FormulaError`
    /// encountered (matching the reference's exception-based propagation).
    pub fn evaluate(
        &self,
        lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ref(pos) => lookup(*pos),
            Expr::Neg(inner) => Ok(-inner.evaluate(lookup)?),
            Expr::Add(a, b) => Ok(a.evaluate(lookup)? + b.evaluate(lookup)?),
            Expr::Sub(a, b) => Ok(a.evaluate(lookup)? - b.evaluate(lookup)?),
            Expr::Mul(a, b) => Ok(a.evaluate(lookup)? * b.evaluate(lookup)?),
            Expr::Div(a, b) => {
                let lhs = a.evaluate(lookup)?;
                let rhs = b.evaluate(lookup)?;
                if rhs == 0.0 {
                    Err(FormulaError::Arithmetic)
                } else {
                    Ok(lhs / rhs)
                }
            }
        }
    }

    /// Collect referenced positions in source (left-to-right, depth-first)
    /// order, de-duplicated. Invalid positions are kept — the caller
    /// decides whether to filter them.
    pub fn referenced_positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ref(pos) => {
                if !out.contains(pos) {
                    out.push(*pos);
                }
            }
            Expr::Neg(inner) => inner.collect_refs(out),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.collect_refs(out);
                b.collect_refs(out);
            }
        }
    }

    /// Render the canonical textual form used to round-trip `Cell::text`.
    pub fn to_canonical_string(&self) -> String {
        match self {
            Expr::Number(n) => format_number_literal(*n),
            Expr::Ref(pos) => pos.to_a1(),
            Expr::Neg(inner) => format!("-{}", paren_if_binary(inner)),
            Expr::Add(a, b) => format!("{}+{}", a.to_canonical_string(), paren_if_lower(b, 1)),
            Expr::Sub(a, b) => format!("{}-{}", a.to_canonical_string(), paren_if_le(b, 1)),
            Expr::Mul(a, b) => format!("{}*{}", paren_if_lower(a, 2), paren_if_lower(b, 2)),
            Expr::Div(a, b) => format!("{}/{}", paren_if_lower(a, 2), paren_if_le(b, 2)),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            _ => 3,
        }
    }
}

fn format_number_literal(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

fn paren_if_binary(e: &Expr) -> String {
    match e {
        Expr::Add(..) | Expr::Sub(..) | Expr::Mul(..) | Expr::Div(..) => {
            format!("({})", e.to_canonical_string())
        }
        _ => e.to_canonical_string(),
    }
}

fn paren_if_lower(e: &Expr, min_precedence: u8) -> String {
    if e.precedence() < min_precedence {
        format!("({})", e.to_canonical_string())
    } else {
        e.to_canonical_string()
    }
}

fn paren_if_le(e: &Expr, min_precedence: u8) -> String {
    if e.precedence() <= min_precedence {
        format!("({})", e.to_canonical_string())
    } else {
        e.to_canonical_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_arithmetic_error() {
        let expr = Expr::Div(Box::new(Expr::Number(1.0)), Box::new(Expr::Number(0.0)));
        assert_eq!(expr.evaluate(&mut |_| Ok(0.0)), Err(FormulaError::Arithmetic));
    }

    #[test]
    fn ref_error_propagates_through_arithmetic() {
        let expr = Expr::Add(
            Box::new(Expr::Ref(Position::new(0, 0))),
            Box::new(Expr::Number(1.0)),
        );
        let mut lookup = |_: Position| Err(FormulaError::Ref);
        assert_eq!(expr.evaluate(&mut lookup), Err(FormulaError::Ref));
    }

    #[test]
    fn refs_are_deduplicated_in_source_order() {
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);
        let expr = Expr::Add(
            Box::new(Expr::Ref(a1)),
            Box::new(Expr::Add(Box::new(Expr::Ref(b1)), Box::new(Expr::Ref(a1)))),
        );
        assert_eq!(expr.referenced_positions(), vec![a1, b1]);
    }

    #[test]
    fn canonical_string_parenthesizes_lower_precedence_subtrees() {
        // (A1+1)*2
        let expr = Expr::Mul(
            Box::new(Expr::Add(
                Box::new(Expr::Ref(Position::new(0, 0))),
                Box::new(Expr::Number(1.0)),
            )),
            Box::new(Expr::Number(2.0)),
        );
        assert_eq!(expr.to_canonical_string(), "(A1+1)*2");
    }
}
