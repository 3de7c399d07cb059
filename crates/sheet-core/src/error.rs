//! Errors raised directly from `Sheet` operations.
//!
//! These are structural: they are returned immediately from `set_cell`,
//! never cached, and never silently swallowed. Contrast with
//! `sheet_types::FormulaError`, which is a runtime evaluation result that
//! flows through `CellValue` like any other value.

use thiserror::Error;

use sheet_types::FormulaParseError;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SheetError {
    #[error("'{0}' is not a valid cell position")]
    InvalidPosition(String),

    #[error(transparent)]
    FormulaParse(#[from] FormulaParseError),

    #[error("formula at {0} would create a circular dependency")]
    CircularDependency(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;
