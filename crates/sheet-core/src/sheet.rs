//! Sparse storage of cells plus the edit API: materialization, cycle
//! detection, edge rewiring, and transitive cache invalidation.

use std::collections::btree_map::Entry as BTreeEntry;
use std::collections::hash_map::Entry as HashEntry;
use std::collections::{BTreeMap, HashMap, HashSet};

use sheet_types::{CellValue, FormulaError, FormulaParser, Position};

use crate::body::{classify_plain_text, is_formula_text, CellBody};
use crate::cell::Cell;
use crate::error::{Result, SheetError};

/// The cell graph. Cells are stored sparsely, keyed by position; row and
/// column occupancy counters track the printable bounding box without
/// scanning the whole map.
pub struct Sheet {
    cells: HashMap<Position, Cell>,
    row_counts: BTreeMap<i64, usize>,
    col_counts: BTreeMap<i64, usize>,
    parser: Box<dyn FormulaParser>,
}

impl Sheet {
    /// A new, empty sheet using the default arithmetic formula parser.
    pub fn new() -> Sheet {
        Sheet::with_parser(Box::new(sheet_formula::ArithmeticParser))
    }

    /// An empty sheet using an injected formula parser, for callers that
    /// want a different expression language without touching the graph.
    pub fn with_parser(parser: Box<dyn FormulaParser>) -> Sheet {
        Sheet {
            cells: HashMap::new(),
            row_counts: BTreeMap::new(),
            col_counts: BTreeMap::new(),
            parser,
        }
    }

    /// Parse `text` and install it at `pos`, materializing any referenced
    /// cells, rejecting the edit if it would introduce a cycle, and
    /// invalidating dependents' caches on success. On any error the sheet is
    /// left as it was, aside from an Empty placeholder that may have been
    /// created at `pos` or at a referenced position (see the crate's
    /// grounding notes for why this is an unavoidable consequence of
    /// materializing before the cycle check).
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(describe(pos)));
        }
        self.ensure_cell(pos);

        let candidate = self.build_body(text)?;
        let new_out_edges: HashSet<Position> = candidate.referenced_positions().into_iter().collect();

        for &referenced in &new_out_edges {
            self.ensure_cell(referenced);
        }

        if self.creates_cycle(pos, &new_out_edges) {
            return Err(SheetError::CircularDependency(describe(pos)));
        }

        self.commit(pos, candidate, new_out_edges);
        Ok(())
    }

    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(describe(pos)));
        }
        Ok(self.cells.get(&pos))
    }

    /// Evaluate the cell at `pos` (the empty string for an absent or Empty
    /// cell), memoizing formula results along the way.
    pub fn value(&self, pos: Position) -> Result<CellValue> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(describe(pos)));
        }
        Ok(self.cell_value(pos))
    }

    /// Collapse the cell at `pos` to Empty, rewiring edges and invalidating
    /// dependents exactly as a body swap would. A cell with no remaining
    /// dependents and no references of its own is dropped from storage
    /// entirely.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(describe(pos)));
        }
        let Some(cell) = self.cells.get(&pos) else {
            return Ok(());
        };
        let old_out_edges: Vec<Position> = cell.out_edges.iter().copied().collect();

        for target in &old_out_edges {
            if let Some(target_cell) = self.cells.get_mut(target) {
                target_cell.in_edges.remove(&pos);
            }
        }

        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.body = CellBody::Empty;
            cell.out_edges.clear();
        }

        self.invalidate_transitively(pos);
        self.collect_if_unreferenced(pos);
        Ok(())
    }

    /// `(max_occupied_row + 1, max_occupied_col + 1)`, or `(0, 0)` if the
    /// sheet holds no materialized cell.
    pub fn printable_size(&self) -> (i64, i64) {
        let max_row = self.row_counts.keys().next_back().copied();
        let max_col = self.col_counts.keys().next_back().copied();
        match (max_row, max_col) {
            (Some(r), Some(c)) => (r + 1, c + 1),
            _ => (0, 0),
        }
    }

    pub fn print_values(&self) -> String {
        crate::printer::print_values(self)
    }

    pub fn print_texts(&self) -> String {
        crate::printer::print_texts(self)
    }

    fn build_body(&self, text: &str) -> Result<CellBody> {
        if is_formula_text(text) {
            let artifact = self.parser.parse(&text[1..])?;
            Ok(CellBody::formula(artifact))
        } else {
            Ok(classify_plain_text(text))
        }
    }

    /// Insert an Empty cell at `pos` if one isn't already stored, bumping the
    /// occupancy counters on that insertion. Occupancy tracks storage
    /// presence, not non-emptiness: a position materialized only because a
    /// formula elsewhere references it counts towards `printable_size`, the
    /// same as the reference implementation's recursive `set_cell(pos, "")`
    /// materialization does.
    fn ensure_cell(&mut self, pos: Position) {
        if let HashEntry::Vacant(entry) = self.cells.entry(pos) {
            entry.insert(Cell::empty());
            self.increment_occupancy(pos);
        }
    }

    /// A cycle would exist iff `pos` is reachable from some member of
    /// `new_out_edges` via existing `out_edges`. DFS seeded at the
    /// referenced cells, stopping the instant it would visit `pos`.
    fn creates_cycle(&self, pos: Position, new_out_edges: &HashSet<Position>) -> bool {
        let mut visited: HashSet<Position> = HashSet::new();
        let mut stack: Vec<Position> = new_out_edges.iter().copied().collect();
        while let Some(current) = stack.pop() {
            if current == pos {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cells.get(&current) {
                stack.extend(cell.out_edges.iter().copied());
            }
        }
        false
    }

    fn commit(&mut self, pos: Position, candidate: CellBody, new_out_edges: HashSet<Position>) {
        let old_out_edges: HashSet<Position> = self
            .cells
            .get(&pos)
            .map(|c| c.out_edges.clone())
            .unwrap_or_default();

        for old_target in &old_out_edges {
            if let Some(target_cell) = self.cells.get_mut(old_target) {
                target_cell.in_edges.remove(&pos);
            }
        }
        for new_target in &new_out_edges {
            if let Some(target_cell) = self.cells.get_mut(new_target) {
                target_cell.in_edges.insert(pos);
            }
        }

        let cell = self.cells.get_mut(&pos).expect("materialized by set_cell");
        cell.body = candidate;
        cell.out_edges = new_out_edges;

        self.invalidate_transitively(pos);
    }

    /// Clear `start`'s cache unconditionally, then walk `in_edges*`,
    /// clearing and continuing through any cell whose cache was valid and
    /// stopping at one that was already invalid.
    fn invalidate_transitively(&mut self, start: Position) {
        let Some(start_cell) = self.cells.get(&start) else {
            return;
        };
        start_cell.body.invalidate_cache();

        let mut stack: Vec<Position> = start_cell.in_edges.iter().copied().collect();
        let mut visited: HashSet<Position> = HashSet::new();
        while let Some(pos) = stack.pop() {
            if !visited.insert(pos) {
                continue;
            }
            let Some(cell) = self.cells.get(&pos) else {
                continue;
            };
            if !cell.body.is_cache_valid() {
                continue;
            }
            cell.body.invalidate_cache();
            stack.extend(cell.in_edges.iter().copied());
        }
    }

    /// Drop an Empty, unreferenced cell from storage and release its
    /// occupancy, mirroring the lifetime policy: "a cell object is deleted
    /// only when no dependents hold it."
    fn collect_if_unreferenced(&mut self, pos: Position) {
        let collectible = self
            .cells
            .get(&pos)
            .map(|c| c.body.is_empty() && c.in_edges.is_empty() && c.out_edges.is_empty())
            .unwrap_or(false);
        if collectible {
            self.cells.remove(&pos);
            self.decrement_occupancy(pos);
        }
    }

    fn increment_occupancy(&mut self, pos: Position) {
        *self.row_counts.entry(pos.row).or_insert(0) += 1;
        *self.col_counts.entry(pos.col).or_insert(0) += 1;
    }

    fn decrement_occupancy(&mut self, pos: Position) {
        decrement_count(&mut self.row_counts, pos.row);
        decrement_count(&mut self.col_counts, pos.col);
    }

    pub(crate) fn cell_value(&self, pos: Position) -> CellValue {
        match self.cells.get(&pos) {
            None => CellValue::String(String::new()),
            Some(cell) => cell.value(self),
        }
    }

    /// The lookup bound into every formula evaluation: invalid positions are
    /// `Ref` errors, missing or Empty cells are `0.0`, Text cells parse
    /// strictly, and Formula cells recurse (propagating their own error, if
    /// any).
    pub(crate) fn lookup(&self, pos: Position) -> Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        match self.cell_value(pos) {
            CellValue::String(s) => sheet_types::parse_strict_float(&s),
            CellValue::Number(n) => Ok(n),
            CellValue::Error(e) => Err(e),
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Sheet::new()
    }
}

fn decrement_count(counts: &mut BTreeMap<i64, usize>, key: i64) {
    if let BTreeEntry::Occupied(mut entry) = counts.entry(key) {
        *entry.get_mut() -= 1;
        if *entry.get() == 0 {
            entry.remove();
        }
    }
}

fn describe(pos: Position) -> String {
    let encoded = pos.to_a1();
    if encoded.is_empty() {
        format!("({}, {})", pos.row, pos.col)
    } else {
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitive_invalidation_updates_dependent_value() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "2").unwrap();
        sheet.set_cell(Position::new(1, 0), "=A1+3").unwrap();
        assert_eq!(sheet.value(Position::new(1, 0)).unwrap(), CellValue::Number(5.0));

        sheet.set_cell(Position::new(0, 0), "4").unwrap();
        assert_eq!(sheet.value(Position::new(1, 0)).unwrap(), CellValue::Number(7.0));
    }

    #[test]
    fn circular_dependency_is_rejected_and_state_is_unchanged() {
        let mut sheet = Sheet::new();
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);
        sheet.set_cell(a1, "=B1").unwrap();
        let err = sheet.set_cell(b1, "=A1").unwrap_err();
        assert_eq!(err, SheetError::CircularDependency("B1".to_string()));

        let b1_cell = sheet.get_cell(b1).unwrap().unwrap();
        assert_eq!(b1_cell.text(), "");
        assert_eq!(sheet.value(a1).unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn escaped_text_round_trips() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "'=not a formula").unwrap();
        let a1 = sheet.get_cell(Position::new(0, 0)).unwrap().unwrap();
        assert_eq!(a1.text(), "'=not a formula");
        assert_eq!(
            sheet.value(Position::new(0, 0)).unwrap(),
            CellValue::String("=not a formula".to_string())
        );
    }

    #[test]
    fn non_numeric_text_reference_is_a_value_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "hello").unwrap();
        sheet.set_cell(Position::new(1, 0), "=A1+1").unwrap();
        assert_eq!(
            sheet.value(Position::new(1, 0)).unwrap(),
            CellValue::Error(FormulaError::Value)
        );
    }

    #[test]
    fn division_by_zero_propagates_as_arithmetic_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "=1/0").unwrap();
        assert_eq!(
            sheet.value(Position::new(0, 0)).unwrap(),
            CellValue::Error(FormulaError::Arithmetic)
        );

        sheet.set_cell(Position::new(1, 0), "=A1+1").unwrap();
        assert_eq!(
            sheet.value(Position::new(1, 0)).unwrap(),
            CellValue::Error(FormulaError::Arithmetic)
        );
    }

    #[test]
    fn referencing_an_untouched_position_materializes_it() {
        let mut sheet = Sheet::new();
        let z99 = Position::new(98, 25);
        sheet.set_cell(Position::new(0, 0), "=Z99").unwrap();

        let cell = sheet.get_cell(z99).unwrap();
        assert!(cell.is_some());
        assert_eq!(sheet.printable_size(), (99, 26));
    }

    #[test]
    fn printable_size_shrinks_back_to_zero_after_clearing_the_only_cell() {
        let mut sheet = Sheet::new();
        let a1 = Position::new(0, 0);
        sheet.set_cell(a1, "x").unwrap();
        assert_eq!(sheet.printable_size(), (1, 1));

        sheet.clear_cell(a1).unwrap();
        assert_eq!(sheet.printable_size(), (0, 0));
    }

    #[test]
    fn occupancy_counters_do_not_overcount_repeated_sets() {
        let mut sheet = Sheet::new();
        let a1 = Position::new(0, 0);
        sheet.set_cell(a1, "x").unwrap();
        sheet.set_cell(a1, "y").unwrap();
        sheet.set_cell(a1, "z").unwrap();
        assert_eq!(sheet.printable_size(), (1, 1));

        sheet.clear_cell(a1).unwrap();
        assert_eq!(sheet.printable_size(), (0, 0));
    }

    #[test]
    fn clearing_a_cell_invalidates_its_dependents_cache() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "5").unwrap();
        sheet.set_cell(Position::new(1, 0), "=A1+1").unwrap();
        assert_eq!(sheet.value(Position::new(1, 0)).unwrap(), CellValue::Number(6.0));

        sheet.clear_cell(Position::new(0, 0)).unwrap();
        assert_eq!(sheet.value(Position::new(1, 0)).unwrap(), CellValue::Number(1.0));
    }

    #[test]
    fn invalid_position_is_rejected() {
        let mut sheet = Sheet::new();
        let bad = Position::new(-1, 0);
        assert!(matches!(sheet.set_cell(bad, "1"), Err(SheetError::InvalidPosition(_))));
        assert!(matches!(sheet.get_cell(bad), Err(SheetError::InvalidPosition(_))));
        assert!(matches!(sheet.clear_cell(bad), Err(SheetError::InvalidPosition(_))));
    }
}
