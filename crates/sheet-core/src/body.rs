//! The tagged content of a cell: empty, literal text, or a compiled formula.

use std::cell::RefCell;

use sheet_types::{CellValue, Formula, FormulaError, Position};

const ESCAPE_SIGN: char = '\'';

/// The content of a single cell. The three variants are a closed set — see
/// `Sheet::set_cell` for how raw edit text is classified into one of these.
pub enum CellBody {
    Empty,
    Text(String),
    Formula {
        artifact: Box<dyn Formula>,
        cache: RefCell<Option<Result<f64, FormulaError>>>,
    },
}

impl CellBody {
    pub fn formula(artifact: Box<dyn Formula>) -> CellBody {
        CellBody::Formula {
            artifact,
            cache: RefCell::new(None),
        }
    }

    /// Evaluate (or return the memoized result of) this body. `lookup`
    /// resolves a referenced position to a number or error; it is bound to
    /// the owning sheet by the caller.
    pub fn value(&self, lookup: &mut dyn FnMut(Position) -> Result<f64, FormulaError>) -> CellValue {
        match self {
            CellBody::Empty => CellValue::String(String::new()),
            CellBody::Text(s) => CellValue::String(strip_escape(s)),
            CellBody::Formula { artifact, cache } => {
                if let Some(cached) = *cache.borrow() {
                    return CellValue::from(cached);
                }
                let result = artifact.evaluate(lookup);
                *cache.borrow_mut() = Some(result);
                CellValue::from(result)
            }
        }
    }

    pub fn text(&self) -> String {
        match self {
            CellBody::Empty => String::new(),
            CellBody::Text(s) => s.clone(),
            CellBody::Formula { artifact, .. } => format!("={}", artifact.expression()),
        }
    }

    /// Declared references, valid positions only. Used both for edge
    /// materialization/cycle detection and for the read-side
    /// `Cell::referenced_positions`.
    pub fn referenced_positions(&self) -> Vec<Position> {
        match self {
            CellBody::Formula { artifact, .. } => artifact
                .referenced_positions()
                .iter()
                .copied()
                .filter(Position::is_valid)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_cache_valid(&self) -> bool {
        match self {
            CellBody::Formula { cache, .. } => cache.borrow().is_some(),
            _ => false,
        }
    }

    pub fn invalidate_cache(&self) {
        if let CellBody::Formula { cache, .. } = self {
            *cache.borrow_mut() = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellBody::Empty)
    }
}

fn strip_escape(s: &str) -> String {
    match s.strip_prefix(ESCAPE_SIGN) {
        Some(rest) => rest.to_string(),
        None => s.to_string(),
    }
}

/// Classify raw edit text into Empty or Text. Formula text (`=...`) is
/// handled separately by `Sheet::set_cell`, which needs the injected parser.
pub fn classify_plain_text(text: &str) -> CellBody {
    if text.is_empty() {
        CellBody::Empty
    } else {
        CellBody::Text(text.to_string())
    }
}

/// `=...` is a formula only when at least one character follows the sign; a
/// lone `"="` is plain text.
pub fn is_formula_text(text: &str) -> bool {
    text.starts_with('=') && text.len() > 1
}
