use crate::dom::{Row, Table};
use crate::header::HeaderCells;

/// Body rows of a table split around the header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPartition {
    /// First body row when it is the table's header
    pub embedded_header: Option<Row>,
    /// Every other body row, in current order
    pub data_rows: Vec<Row>,
}

impl RowPartition {
    pub fn is_header(&self, row: &Row) -> bool {
        self.embedded_header.as_ref().is_some_and(|h| h.ptr_eq(row))
    }
}

/// Whether `row` is the row holding the resolved header.
///
/// Both checks are identity checks: the header's first cell must be the row's
/// first cell, and that cell's parent must be the row itself.
pub fn is_embedded_header(row: &Row, header: &HeaderCells) -> bool {
    let (Some(header_cell), Some(row_cell)) = (header.first(), row.cell(0)) else {
        return false;
    };
    header_cell.ptr_eq(&row_cell)
        && header_cell
            .parent()
            .is_some_and(|parent| parent.ptr_eq(row))
}

/// Split the first body section into the embedded header (if any) and data rows.
///
/// A header coming from a header section never matches a body row, so the
/// embedded header only exists for tables without one.
pub fn classify_rows(table: &Table, header: &HeaderCells) -> RowPartition {
    let Some(body) = table.first_body() else {
        return RowPartition::default();
    };

    let mut rows = body.rows();
    let embedded = rows
        .first()
        .is_some_and(|first| is_embedded_header(first, header));
    let embedded_header = if embedded { Some(rows.remove(0)) } else { None };

    RowPartition {
        embedded_header,
        data_rows: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Cell, Section, SectionKind};
    use crate::header::resolve_header_cells;

    fn body_table(rows: &[&[&str]]) -> Table {
        let table = Table::new(None);
        table.add_body(Section::with_rows(
            SectionKind::Body,
            rows.iter().map(|r| Row::from_texts(false, r)).collect(),
        ));
        table
    }

    #[test]
    fn first_body_row_is_embedded_header() {
        let table = body_table(&[&["Name"], &["b"], &["a"]]);
        let header = resolve_header_cells(&table, true);

        let partition = classify_rows(&table, &header);
        let first = table.first_body().unwrap().first_row().unwrap();
        assert_eq!(partition.embedded_header, Some(first.clone()));
        assert!(partition.is_header(&first));
        assert_eq!(partition.data_rows.len(), 2);
    }

    #[test]
    fn header_section_means_no_embedded_header() {
        let table = body_table(&[&["Name"], &["b"]]);
        table.set_head(Section::with_rows(
            SectionKind::Head,
            vec![Row::from_texts(true, &["Name"])],
        ));
        let header = resolve_header_cells(&table, true);

        let partition = classify_rows(&table, &header);
        assert!(partition.embedded_header.is_none());
        assert_eq!(partition.data_rows.len(), 2);
    }

    #[test]
    fn equal_text_is_not_identity() {
        let table = body_table(&[&["Name"], &["b"]]);
        let lookalike = HeaderCells::new(Row::from_texts(false, &["Name"]).cells());

        let partition = classify_rows(&table, &lookalike);
        assert!(partition.embedded_header.is_none());
    }

    #[test]
    fn moved_cell_no_longer_matches_row() {
        let table = body_table(&[&["x", "x2"], &["y", "y2"]]);
        let first = table.first_body().unwrap().first_row().unwrap();
        let first_cell = first.cell(0).unwrap();

        // header claims the row's first cell, but that cell has moved elsewhere
        let header = HeaderCells::new(vec![first_cell.clone()]);
        let elsewhere = Row::new(vec![Cell::data("z")]);
        elsewhere.append_cell(first_cell);

        assert!(!is_embedded_header(&first, &header));
    }

    #[test]
    fn empty_header_or_row_never_matches() {
        let empty_row = Row::new(Vec::new());
        let header = HeaderCells::new(Row::from_texts(true, &["a"]).cells());
        assert!(!is_embedded_header(&empty_row, &header));

        let row = Row::from_texts(false, &["a"]);
        assert!(!is_embedded_header(&row, &HeaderCells::default()));
    }

    #[test]
    fn missing_body_gives_empty_partition() {
        let table = Table::new(None);
        table.set_head(Section::with_rows(
            SectionKind::Head,
            vec![Row::from_texts(true, &["a"])],
        ));
        let header = resolve_header_cells(&table, true);
        assert_eq!(classify_rows(&table, &header), RowPartition::default());
    }
}
