//! The seam between the cell graph and the formula expression language.
//!
//! The core treats the parser and its compiled artifacts as opaque: it
//! never inspects a formula's grammar, only calls through these two
//! traits. This is what lets `sheet-core` depend on a `dyn FormulaParser`
//! rather than hard-coding a grammar of its own.

use std::fmt;

use thiserror::Error;

use crate::position::Position;
use crate::value::FormulaError;

/// A parsed, evaluable formula expression.
pub trait Formula: fmt::Debug {
    /// Evaluate the formula. `lookup` resolves a referenced position to a
    /// number or error, per spec §4.3's lookup semantics; it is expected to
    /// be bound to the owning sheet.
    fn evaluate(
        &self,
        lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError>;

    /// Positions the formula references, in source order, de-duplicated.
    /// May include invalid positions; the core is responsible for filtering
    /// those out where the spec calls for "valid references only" (e.g.
    /// `Cell::referenced_positions`) and for leaving them in where it calls
    /// for the raw declared set (e.g. edge materialization, which must see
    /// every reference to decide whether a cycle exists).
    fn referenced_positions(&self) -> &[Position];

    /// The canonical textual form of the expression (without the leading
    /// `=`), used to round-trip `Cell::text`.
    fn expression(&self) -> &str;
}

/// A formula compiler, injected into the cell graph.
pub trait FormulaParser {
    /// Parse formula text *without* the leading `=`. Parse failure is a
    /// user-visible error; it must not be cached or treated as a runtime
    /// `FormulaError`.
    fn parse(&self, text: &str) -> Result<Box<dyn Formula>, FormulaParseError>;
}

/// Formula text failed to parse. Carries enough detail to report a useful
/// message without forcing the core to understand the grammar.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("formula parse error: {message}")]
pub struct FormulaParseError {
    pub message: String,
}

impl FormulaParseError {
    pub fn new(message: impl Into<String>) -> Self {
        FormulaParseError {
            message: message.into(),
        }
    }
}
