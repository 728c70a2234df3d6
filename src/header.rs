use tracing::{debug, warn};

use crate::dom::{Cell, Row, SectionKind, SortState, Table};

/// Header cells of a table, one per column, resolved for a single operation.
///
/// Never keep one of these across operations: sorting or filtering in between
/// may have moved rows around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCells {
    cells: Vec<Cell>,
}

impl HeaderCells {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn first(&self) -> Option<&Cell> {
        self.cells.first()
    }

    /// Row the header cells live in
    pub fn row(&self) -> Option<Row> {
        self.first().and_then(Cell::parent)
    }

    pub fn sort_state(&self, col: usize) -> SortState {
        self.get(col).map(Cell::sort_state).unwrap_or_default()
    }

    pub fn set_sort_state(&self, col: usize, state: SortState) {
        if let Some(cell) = self.get(col) {
            cell.set_sort_state(state);
        }
    }

    /// Column currently sorted, with its direction
    pub fn sorted_column(&self) -> Option<(usize, SortState)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(col, cell)| (col, cell.sort_state()))
            .find(|(_, state)| *state != SortState::Unsorted)
    }

    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(Cell::text).collect()
    }
}

/// Find the header cells of a table.
///
/// The last row of the header section wins (multi-row headers put the most
/// specific labels last). Without a header section the first row of the table
/// is used, wherever it lives. `silent` suppresses diagnostics for callers that
/// resolve repeatedly within one user action.
pub fn resolve_header_cells(table: &Table, silent: bool) -> HeaderCells {
    if let Some(head) = table.head().filter(|h| !h.is_empty()) {
        if let Some(row) = head.last_row() {
            if !silent {
                debug!(table = ?table.id(), rows = head.len(), "header found in {}", SectionKind::Head.tag());
            }
            return HeaderCells::new(row.cells());
        }
    }

    if let Some(row) = table.first_row() {
        if !silent {
            debug!(table = ?table.id(), "no header section, using first row as header");
        }
        return HeaderCells::new(row.cells());
    }

    if !silent {
        warn!(table = ?table.id(), "no rows to determine a header from");
    }
    HeaderCells::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Section, SectionKind};

    fn body(rows: &[&[&str]]) -> Section {
        Section::with_rows(
            SectionKind::Body,
            rows.iter().map(|r| Row::from_texts(false, r)).collect(),
        )
    }

    #[test]
    fn uses_last_header_section_row() {
        let table = Table::new(None);
        let group = Row::from_texts(true, &["Group", ""]);
        let labels = Row::from_texts(true, &["Name", "Age"]);
        table.set_head(Section::with_rows(
            SectionKind::Head,
            vec![group, labels.clone()],
        ));
        table.add_body(body(&[&["Name", "Age"], &["bob", "3"]]));

        let header = resolve_header_cells(&table, true);
        assert_eq!(header.cells(), labels.cells().as_slice());
        assert_eq!(header.row(), Some(labels));
    }

    #[test]
    fn falls_back_to_first_row() {
        let table = Table::new(None);
        table.add_body(body(&[&["Name", "Age"], &["bob", "3"]]));

        let header = resolve_header_cells(&table, false);
        assert_eq!(header.texts(), vec!["Name", "Age"]);
        assert_eq!(header.row(), table.first_body().unwrap().first_row());
    }

    #[test]
    fn empty_header_section_is_ignored() {
        let table = Table::new(None);
        table.set_head(Section::new(SectionKind::Head));
        table.add_body(body(&[&["a"], &["b"]]));

        assert_eq!(resolve_header_cells(&table, true).texts(), vec!["a"]);
    }

    #[test]
    fn empty_table_has_no_header() {
        let table = Table::new(None);
        assert!(resolve_header_cells(&table, false).is_empty());

        table.add_body(Section::new(SectionKind::Body));
        assert!(resolve_header_cells(&table, true).is_empty());
    }

    #[test]
    fn sort_state_accessors() {
        let header = HeaderCells::new(Row::from_texts(true, &["a", "b"]).cells());
        assert_eq!(header.sorted_column(), None);

        header.set_sort_state(1, SortState::Descending);
        assert_eq!(header.sort_state(1), SortState::Descending);
        assert_eq!(header.sorted_column(), Some((1, SortState::Descending)));

        // out of range columns read as unsorted and ignore writes
        header.set_sort_state(9, SortState::Ascending);
        assert_eq!(header.sort_state(9), SortState::Unsorted);
    }
}
