use tracing::debug;

use crate::classify::classify_rows;
use crate::dom::{Row, Table};
use crate::header::resolve_header_cells;

/// Data rows left visible and hidden by a filter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub shown: usize,
    pub hidden: usize,
}

/// Whether any cell of `row` contains `needle`, which must already be lower-cased
pub fn row_matches(row: &Row, needle: &str) -> bool {
    row.cells()
        .iter()
        .any(|cell| cell.text().to_lowercase().contains(needle))
}

/// Show the rows of the first body section that contain `query`, hide the rest.
///
/// Matching is a case-insensitive substring test over every cell. An embedded
/// header row is always shown. Rows are only toggled, never moved.
pub fn filter(table: &Table, query: &str) -> FilterOutcome {
    if table.first_body().is_none() {
        debug!(table = ?table.id(), "no body section, skipping filter");
        return FilterOutcome::default();
    }

    let needle = query.trim().to_lowercase();
    let header = resolve_header_cells(table, true);
    let partition = classify_rows(table, &header);

    if let Some(row) = &partition.embedded_header {
        row.set_visible(true);
    }

    let mut outcome = FilterOutcome::default();
    for row in &partition.data_rows {
        let visible = needle.is_empty() || row_matches(row, &needle);
        row.set_visible(visible);
        if visible {
            outcome.shown += 1;
        } else {
            outcome.hidden += 1;
        }
    }

    debug!(table = ?table.id(), query = %needle, shown = outcome.shown, hidden = outcome.hidden, "filtered");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Section, SectionKind};
    use crate::sort::sort;

    fn single_column(header_in_body: bool, values: &[&str]) -> Table {
        let table = Table::new(None);
        let mut rows: Vec<Row> = values.iter().map(|v| Row::from_texts(false, &[*v])).collect();
        if header_in_body {
            rows.insert(0, Row::from_texts(true, &["Fruit"]));
        } else {
            table.set_head(Section::with_rows(
                SectionKind::Head,
                vec![Row::from_texts(true, &["Fruit"])],
            ));
        }
        table.add_body(Section::with_rows(SectionKind::Body, rows));
        table
    }

    fn visibility(table: &Table) -> Vec<(String, bool)> {
        table
            .first_body()
            .unwrap()
            .rows()
            .iter()
            .map(|r| (r.texts().join(","), r.is_visible()))
            .collect()
    }

    #[test]
    fn substring_is_case_insensitive() {
        let table = single_column(false, &["Banana", "Orange", "Mango"]);

        // "Orange" holds "an" too, so every row stays
        assert_eq!(filter(&table, "AN"), FilterOutcome { shown: 3, hidden: 0 });

        let outcome = filter(&table, " ang ");
        assert_eq!(outcome, FilterOutcome { shown: 2, hidden: 1 });
        assert_eq!(
            visibility(&table),
            vec![
                ("Banana".to_string(), false),
                ("Orange".to_string(), true),
                ("Mango".to_string(), true),
            ]
        );
    }

    #[test]
    fn empty_query_shows_everything() {
        let table = single_column(false, &["a", "b"]);
        filter(&table, "zzz");
        let outcome = filter(&table, "   ");
        assert_eq!(outcome, FilterOutcome { shown: 2, hidden: 0 });
        assert!(visibility(&table).iter().all(|(_, v)| *v));
    }

    #[test]
    fn embedded_header_is_never_hidden() {
        let table = single_column(true, &["Banana", "Orange"]);
        let header_row = table.first_body().unwrap().first_row().unwrap();

        let outcome = filter(&table, "no such fruit");
        assert_eq!(outcome, FilterOutcome { shown: 0, hidden: 2 });
        assert!(header_row.is_visible());

        // a header hidden from elsewhere is shown again
        header_row.set_visible(false);
        filter(&table, "fruit");
        assert!(header_row.is_visible());
    }

    #[test]
    fn sort_then_filter_then_sort_agree_on_header() {
        let table = single_column(true, &["pear", "apple", "plum"]);
        let header_row = table.first_body().unwrap().first_row().unwrap();

        sort(&table, 0, false).unwrap();
        filter(&table, "ea");
        sort(&table, 0, true).unwrap();

        let body = table.first_body().unwrap();
        assert_eq!(body.first_row(), Some(header_row.clone()));
        assert!(header_row.is_visible());
        assert_eq!(
            visibility(&table),
            vec![
                ("Fruit ^".to_string(), true),
                ("apple".to_string(), false),
                ("pear".to_string(), true),
                ("plum".to_string(), false),
            ]
        );
    }

    #[test]
    fn missing_body_is_noop() {
        let table = Table::new(None);
        table.set_head(Section::with_rows(
            SectionKind::Head,
            vec![Row::from_texts(true, &["x"])],
        ));
        assert_eq!(filter(&table, "x"), FilterOutcome::default());
        assert!(table.head().unwrap().first_row().unwrap().is_visible());
    }

    #[test]
    fn filter_does_not_reorder() {
        let table = single_column(false, &["b", "a", "c"]);
        filter(&table, "a");
        let order: Vec<String> = visibility(&table).into_iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
