//! The spreadsheet cell graph: sparse storage, dependency tracking, cycle
//! detection, and transitive cache invalidation.
//!
//! This crate contains no formula grammar. Formula text is compiled by a
//! `sheet_types::FormulaParser` injected into the `Sheet` (defaulting to
//! `sheet_formula::ArithmeticParser`); the graph only ever calls through
//! that trait and `sheet_types::Formula`.

mod body;
mod cell;
pub mod error;
mod printer;
mod sheet;

pub use body::CellBody;
pub use cell::Cell;
pub use error::{Result, SheetError};
pub use sheet::Sheet;

pub use sheet_types::{CellValue, FormulaError, Position};
