//! Shared vocabulary for the sheet cell graph: positions, values, and the
//! trait seam the formula expression language is injected through.

mod formula_trait;
mod position;
mod value;

pub use formula_trait::{Formula, FormulaParseError, FormulaParser};
pub use position::{col_to_letters, decode_a1, Position, MAX_COLS, MAX_ROWS};
pub use value::{parse_strict_float, CellValue, FormulaError};
