//! Activation over every table of a document and dispatch of user events
//!
//! Each table is handled behind its own isolation boundary: an error or a
//! panic while working on one table is logged and reported, and the other
//! tables keep working.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use crate::dom::{Document, SortState, Table};
use crate::error::{EnhanceError, Result};
use crate::filter::{filter, FilterOutcome};
use crate::header::resolve_header_cells;
use crate::sort::{sort, update_indicators, SortOutcome};

pub const DEFAULT_PLACEHOLDER: &str = "Search table...";

/// Text input that drives the filter of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterInput {
    pub placeholder: String,
    pub label: String,
    value: String,
}

impl FilterInput {
    fn new(placeholder: &str, table_number: usize) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            label: format!("Filter table {}", table_number),
            value: String::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// What happened in response to a user event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Sorted(SortOutcome),
    Filtered(FilterOutcome),
    /// The event does not apply (unknown column, table without header)
    Ignored,
    Failed(String),
}

#[derive(Debug)]
struct EnhancedTable {
    table: Table,
    /// 1-based, as shown to users
    number: usize,
    filter_input: FilterInput,
    /// Columns with a click handler; zero when no header was found
    sortable_columns: usize,
}

/// Every table of a document with its filter input and sortable headers
#[derive(Debug, Default)]
pub struct Enhancer {
    document: Document,
    tables: Vec<EnhancedTable>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `work` for one table, turning a panic into an error
pub fn isolate<T>(work: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(EnhanceError::Panicked(panic_message(payload.as_ref()))),
    }
}

impl Enhancer {
    /// Attach a filter input and header sorting to every table of `document`
    pub fn activate(document: Document, placeholder: &str) -> Self {
        info!("activating table enhancer");

        if document.is_empty() {
            info!("no tables found");
            return Self { document, tables: Vec::new() };
        }
        info!(count = document.len(), "found tables, processing");

        let tables = document
            .tables()
            .iter()
            .enumerate()
            .map(|(index, table)| Self::prepare(table, index + 1, placeholder))
            .collect();

        info!("setup finished");
        Self { document, tables }
    }

    fn prepare(table: &Table, number: usize, placeholder: &str) -> EnhancedTable {
        info!(table = number, id = table.id().unwrap_or("none"), "processing table");
        let filter_input = FilterInput::new(placeholder, number);

        let result = isolate(|| {
            let header = resolve_header_cells(table, false);
            if header.is_empty() {
                warn!(table = number, "no header cells identified, skipping sort features");
                return Ok(0);
            }
            info!(table = number, columns = header.len(), "header cells made sortable");
            update_indicators(table, None, true);
            Ok(header.len())
        });

        let sortable_columns = result.unwrap_or_else(|e| {
            error!(table = number, error = %e, "error processing table");
            0
        });

        EnhancedTable {
            table: table.clone(),
            number,
            filter_input,
            sortable_columns,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index).map(|t| &t.table)
    }

    pub fn filter_input(&self, index: usize) -> Option<&FilterInput> {
        self.tables.get(index).map(|t| &t.filter_input)
    }

    pub fn sortable_columns(&self, index: usize) -> usize {
        self.tables.get(index).map_or(0, |t| t.sortable_columns)
    }

    /// Tooltip for a header cell, following its current sort state
    pub fn header_title(&self, index: usize, column: usize) -> Option<String> {
        let entry = self.tables.get(index)?;
        if column >= entry.sortable_columns {
            return None;
        }
        let title = match resolve_header_cells(&entry.table, true).sort_state(column) {
            SortState::Unsorted => "Click to sort".to_string(),
            SortState::Ascending => "Sorted ascending. Click to reverse.".to_string(),
            SortState::Descending => "Sorted descending. Click to reverse.".to_string(),
        };
        Some(title)
    }

    /// Run `work` on table `index` behind its isolation boundary.
    ///
    /// Errors and panics are logged against the table and returned; the
    /// other tables are untouched.
    pub fn with_table<T>(
        &self,
        index: usize,
        action: &str,
        work: impl FnOnce(&Table) -> Result<T>,
    ) -> Result<T> {
        let entry = self
            .tables
            .get(index)
            .ok_or(EnhanceError::NoSuchTable(index + 1))?;
        isolate(|| work(&entry.table)).map_err(|e| {
            error!(table = entry.number, action, error = %e, "table operation failed");
            e
        })
    }

    /// A click on header `column` of table `index` (both 0-based).
    ///
    /// The column sorts descending when it is currently ascending, and
    /// ascending otherwise.
    pub fn click_header(&self, index: usize, column: usize) -> DriverEvent {
        if index < self.tables.len() && column >= self.sortable_columns(index) {
            return DriverEvent::Ignored;
        }
        debug!(table = index + 1, column, "header clicked, attempting sort");

        let result = self.with_table(index, "sort", |table| {
            let state = resolve_header_cells(table, true).sort_state(column);
            let ascending = state != SortState::Ascending;
            sort(table, column, ascending)
        });

        match result {
            Ok(outcome) => DriverEvent::Sorted(outcome),
            Err(e) => DriverEvent::Failed(e.to_string()),
        }
    }

    /// New text in the filter input of table `index` (0-based)
    pub fn input_filter(&mut self, index: usize, text: &str) -> DriverEvent {
        let Some(entry) = self.tables.get_mut(index) else {
            return DriverEvent::Failed(EnhanceError::NoSuchTable(index + 1).to_string());
        };
        entry.filter_input.value = text.to_string();

        match self.with_table(index, "filter", |table| Ok(filter(table, text))) {
            Ok(outcome) => DriverEvent::Filtered(outcome),
            Err(e) => DriverEvent::Failed(e.to_string()),
        }
    }
}
