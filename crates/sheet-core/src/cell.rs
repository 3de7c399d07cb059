//! A single cell: its body plus the two adjacency sets of the dependency
//! graph.

use std::collections::HashSet;

use sheet_types::{CellValue, Position};

use crate::body::CellBody;
use crate::sheet::Sheet;

/// One cell in the sheet. `out_edges` and `in_edges` hold positions, not
/// owning references — both are kept symmetric by `Sheet` (invariant 1 of
/// the dependency graph).
pub struct Cell {
    pub(crate) body: CellBody,
    pub(crate) out_edges: HashSet<Position>,
    pub(crate) in_edges: HashSet<Position>,
}

impl Cell {
    pub(crate) fn empty() -> Cell {
        Cell {
            body: CellBody::Empty,
            out_edges: HashSet::new(),
            in_edges: HashSet::new(),
        }
    }

    /// Evaluate this cell's value. `sheet` is the owning sheet, consulted for
    /// any formula reference; passing it explicitly avoids the cell holding
    /// a persistent back-reference to its owner.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        self.body.value(&mut |pos| sheet.lookup(pos))
    }

    pub fn text(&self) -> String {
        self.body.text()
    }

    pub fn referenced_positions(&self) -> Vec<Position> {
        self.body.referenced_positions()
    }

    /// Whether any other cell's formula directly references this one.
    pub fn is_referenced(&self) -> bool {
        !self.in_edges.is_empty()
    }

    pub fn out_edges(&self) -> &HashSet<Position> {
        &self.out_edges
    }

    pub fn in_edges(&self) -> &HashSet<Position> {
        &self.in_edges
    }
}
