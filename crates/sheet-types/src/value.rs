//! The value types cells and formulas evaluate to.

use std::fmt;

use thiserror::Error;

/// A runtime evaluation failure, as opposed to a structural failure raised
/// directly from `set_cell`. These are first-class results: they flow
/// through `CellValue`, get cached, and propagate through dependent
/// formulas like any other value.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum FormulaError {
    /// A reference names an invalid position.
    #[error("#REF!")]
    Ref,
    /// A referenced cell's text could not be coerced to a number.
    #[error("#VALUE!")]
    Value,
    /// An arithmetic operation is undefined (division by zero).
    #[error("#ARITHM!")]
    Arithmetic,
}

impl FormulaError {
    /// The short tag used by `print_values` (`#REF!`, `#VALUE!`, `#ARITHM!`).
    pub fn tag(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Arithmetic => "#ARITHM!",
        }
    }
}

/// A tagged value returned by `Cell::value`.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    String(String),
    Number(f64),
    Error(FormulaError),
}

impl From<Result<f64, FormulaError>> for CellValue {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

/// Parse a cell's raw text as a number using the strict grammar formulas
/// require: the entire string must be consumed by the float literal, with
/// no leftover characters. Used when a formula references a Text cell.
pub fn parse_strict_float(text: &str) -> Result<f64, FormulaError> {
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse::<f64>().map_err(|_| FormulaError::Value)
}
