//! Column sorting for a table body, keeping an embedded header pinned first

use std::cmp::Ordering;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

use crate::classify::classify_rows;
use crate::dom::{Row, Section, SortState, Table};
use crate::error::{EnhanceError, Result};
use crate::header::resolve_header_cells;

/// Appended to the sorted column's header text
pub const ASCENDING_MARK: &str = " ^";
pub const DESCENDING_MARK: &str = " v";

/// Threshold for building sort keys in parallel
const PARALLEL_THRESHOLD: usize = 10_000;

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoBody,
    TooFewRows,
    NoDataRows,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::NoBody => "table has no body",
            SkipReason::TooFewRows => "fewer than two rows",
            SkipReason::NoDataRows => "no data rows",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    Sorted {
        column: usize,
        ascending: bool,
        rows: usize,
        embedded_header: bool,
    },
    Skipped(SkipReason),
}

/// Parse text that is a decimal number in its entirety.
/// Partial numbers (`10px`) and the `inf`/`nan` spellings are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    if DECIMAL.is_match(text) {
        text.parse().ok()
    } else {
        None
    }
}

/// Comparison key for one cell: trimmed, lower-cased text plus its numeric value
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    text: String,
    number: Option<f64>,
}

impl SortKey {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        let number = parse_decimal(&text);
        Self { text, number }
    }
}

/// Numeric when both sides are numbers, lexicographic otherwise
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a.number, b.number) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.text.cmp(&b.text),
    }
}

/// Compare two optional cells; a missing cell on either side is a tie
fn compare_cells(a: &Option<SortKey>, b: &Option<SortKey>, ascending: bool) -> Ordering {
    let base = match (a, b) {
        (Some(a), Some(b)) => compare_keys(a, b),
        _ => Ordering::Equal,
    };
    if ascending {
        base
    } else {
        base.reverse()
    }
}

/// Stable merge sort.
///
/// The cell comparator is not a total order (a missing cell ties with
/// everything), which the std sorts may panic on.
fn merge_sort_by<T, F>(mut items: Vec<T>, compare: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, compare);
    let right = merge_sort_by(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_left {
            merged.extend(left.next());
        } else {
            merged.extend(right.next());
        }
    }
    merged
}

fn build_keys(rows: &[Row], column: usize) -> Vec<Option<SortKey>> {
    let texts: Vec<Option<String>> = rows
        .iter()
        .map(|row| row.cell(column).map(|cell| cell.text()))
        .collect();

    if texts.len() >= PARALLEL_THRESHOLD {
        texts
            .into_par_iter()
            .map(|text| text.as_deref().map(SortKey::new))
            .collect()
    } else {
        texts
            .iter()
            .map(|text| text.as_deref().map(SortKey::new))
            .collect()
    }
}

/// Check that `order` is a permutation of the rows `body` holds right now
fn validate_order(body: &Section, order: &[Row]) -> Result<()> {
    if order.len() != body.len() {
        return Err(EnhanceError::Structure(format!(
            "body changed size during sort ({} rows, expected {})",
            body.len(),
            order.len()
        )));
    }
    if let Some(pos) = order.iter().position(|row| !body.contains(row)) {
        return Err(EnhanceError::Structure(format!(
            "row {} is no longer part of the table body",
            pos
        )));
    }
    Ok(())
}

/// Sort the first body section of `table` by `column`.
///
/// An embedded header row is always put back as the first body row. The new
/// order is assembled and checked before it replaces the body's rows, so a
/// failure leaves the previous order in place.
pub fn sort(table: &Table, column: usize, ascending: bool) -> Result<SortOutcome> {
    let Some(body) = table.first_body() else {
        debug!(table = ?table.id(), "no body section, skipping sort");
        return Ok(SortOutcome::Skipped(SkipReason::NoBody));
    };
    if body.len() < 2 {
        debug!(table = ?table.id(), rows = body.len(), "fewer than 2 body rows, skipping sort");
        return Ok(SortOutcome::Skipped(SkipReason::TooFewRows));
    }

    let header = resolve_header_cells(table, true);
    let partition = classify_rows(table, &header);
    if partition.data_rows.is_empty() {
        debug!(table = ?table.id(), "no data rows left after excluding header");
        return Ok(SortOutcome::Skipped(SkipReason::NoDataRows));
    }
    if partition.embedded_header.is_some() {
        debug!(table = ?table.id(), "header row is inside the body, pinning it");
    }

    let keys = build_keys(&partition.data_rows, column);
    let keyed: Vec<(Row, Option<SortKey>)> = partition.data_rows.into_iter().zip(keys).collect();
    let sorted = merge_sort_by(
        keyed,
        &|(_, a): &(Row, Option<SortKey>), (_, b): &(Row, Option<SortKey>)| {
            compare_cells(a, b, ascending)
        },
    );

    let mut order = Vec::with_capacity(sorted.len() + 1);
    order.extend(partition.embedded_header.iter().cloned());
    order.extend(sorted.into_iter().map(|(row, _)| row));

    validate_order(&body, &order)?;

    let rows = order.len();
    body.replace_rows(order);

    debug!(table = ?table.id(), column, ascending, rows, "sorted");
    update_indicators(table, Some(column), ascending);

    Ok(SortOutcome::Sorted {
        column,
        ascending,
        rows,
        embedded_header: partition.embedded_header.is_some(),
    })
}

/// Header text with a trailing sort marker removed
pub fn strip_indicator(text: &str) -> &str {
    let text = text.trim();
    text.strip_suffix(ASCENDING_MARK)
        .or_else(|| text.strip_suffix(DESCENDING_MARK))
        .unwrap_or(text)
        .trim()
}

/// Rewrite header cells so only `sorted` carries a direction marker.
///
/// `None` clears every marker. Each header cell's content is replaced by plain
/// text, dropping any inline elements it held.
pub fn update_indicators(table: &Table, sorted: Option<usize>, ascending: bool) {
    let header = resolve_header_cells(table, true);
    if header.is_empty() {
        return;
    }

    for (col, cell) in header.iter().enumerate() {
        let mut text = strip_indicator(&cell.text()).to_string();

        if Some(col) == sorted {
            text.push_str(if ascending { ASCENDING_MARK } else { DESCENDING_MARK });
            header.set_sort_state(col, SortState::from_ascending(ascending));
        } else {
            header.set_sort_state(col, SortState::Unsorted);
        }

        cell.set_text(text);
    }
}
