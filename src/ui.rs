use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell as TuiCell, Paragraph, Row as TuiRow, Table as TuiTable},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::classify::classify_rows;
use crate::dom::{Row, SectionKind, SortState, Table};
use crate::header::resolve_header_cells;
use crate::sort::strip_indicator;

pub const MAX_COLUMN_WIDTH: usize = 30;
const MIN_COLUMN_WIDTH: usize = 3;
const COLUMN_SPACING: u16 = 1;

/// Where the header cells of the last drawn table landed on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    pub header_y: u16,
    /// (x, width) of each sortable header cell
    pub columns: Vec<(u16, u16)>,
    pub body_height: u16,
}

impl TableLayout {
    pub fn column_at(&self, x: u16, y: u16) -> Option<usize> {
        if y != self.header_y {
            return None;
        }
        self.columns
            .iter()
            .position(|&(start, width)| x >= start && x < start.saturating_add(width))
    }
}

/// Cell text on one line
fn display_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_texts(row: &Row) -> Vec<String> {
    row.cells().iter().map(|c| display_text(&c.text())).collect()
}

/// Truncate `text` to `width` columns, marking the cut with an ellipsis
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

pub fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let count = rows.iter().map(Vec::len).fold(header.len(), usize::max);
    (0..count)
        .map(|col| {
            let header_width = header.get(col).map_or(0, |t| t.width());
            rows.iter()
                .filter_map(|r| r.get(col))
                .map(|t| t.width())
                .fold(header_width, usize::max)
                .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Visible rows drawn below the pinned header row
pub fn body_rows(table: &Table) -> Vec<Row> {
    let header_row = resolve_header_cells(table, true).row();
    table
        .rows()
        .into_iter()
        .filter(|r| r.is_visible() && Some(r) != header_row.as_ref())
        .collect()
}

/// Data rows shown and hidden by the current filter
pub fn row_counts(table: &Table) -> (usize, usize) {
    let header = resolve_header_cells(table, true);
    let partition = classify_rows(table, &header);
    let shown = partition.data_rows.iter().filter(|r| r.is_visible()).count();
    (shown, partition.data_rows.len() - shown)
}

pub fn render(frame: &mut Frame, app: &App) -> TableLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_filter_line(frame, app, chunks[0]);
    let layout = render_table(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
    render_message_line(frame, app, chunks[3]);
    layout
}

fn render_filter_line(frame: &mut Frame, app: &App, area: Rect) {
    let Some(input) = app.enhancer.filter_input(app.current) else {
        return;
    };

    let label = format!("{}: ", input.label);
    let value = if input.value().is_empty() {
        Span::styled(input.placeholder.clone(), app.style.filter_placeholder())
    } else {
        Span::styled(input.value().to_string(), app.style.filter_input())
    };
    let cursor_x = area.x + (label.width() + input.value().width()) as u16;

    let line = Line::from(vec![Span::styled(label, app.style.filter_label()), value]);
    frame.render_widget(Paragraph::new(line), area);
    frame.set_cursor(cursor_x.min(area.right().saturating_sub(1)), area.y);
}

fn row_style(app: &App, row: &Row) -> ratatui::style::Style {
    match row.parent().map(|s| s.kind()) {
        Some(SectionKind::Head) => app.style.header_extra_row(),
        Some(SectionKind::Foot) => app.style.footer(),
        _ => app.style.cell(),
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) -> TableLayout {
    let Some(table) = app.enhancer.table(app.current) else {
        let empty = Paragraph::new("No tables found").block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return TableLayout::default();
    };

    let header = resolve_header_cells(table, true);
    let header_texts: Vec<String> = header.iter().map(|c| display_text(&c.text())).collect();
    let rows = body_rows(table);
    let texts: Vec<Vec<String>> = rows.iter().map(cell_texts).collect();
    let widths = column_widths(&header_texts, &texts);

    // borders and the pinned header row
    let body_height = area.height.saturating_sub(3);
    let scroll = app.scroll.min(rows.len().saturating_sub(1));

    let header_cells: Vec<TuiCell> = header_texts
        .iter()
        .enumerate()
        .map(|(col, text)| {
            let style = if col == app.selected_col {
                app.style.header_selected()
            } else if header.sort_state(col) != SortState::Unsorted {
                app.style.header_sorted()
            } else {
                app.style.header()
            };
            TuiCell::from(fit(text, widths[col])).style(style)
        })
        .collect();
    let header_row = TuiRow::new(header_cells).style(app.style.header());

    let body: Vec<TuiRow> = rows
        .iter()
        .zip(&texts)
        .skip(scroll)
        .take(body_height as usize)
        .map(|(row, cells)| {
            let cells: Vec<TuiCell> = cells
                .iter()
                .zip(&widths)
                .map(|(text, width)| TuiCell::from(fit(text, *width)))
                .collect();
            TuiRow::new(cells).style(row_style(app, row))
        })
        .collect();

    let title = match table.id() {
        Some(id) => format!(" {} ", id),
        None => format!(" Table {} ", app.current + 1),
    };
    let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w as u16)).collect();
    let widget = TuiTable::new(body, constraints)
        .header(header_row)
        .column_spacing(COLUMN_SPACING)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);

    // header cell positions inside the border
    let right = area.right().saturating_sub(1);
    let mut x = area.x + 1;
    let mut columns = Vec::new();
    for width in widths.iter().take(app.enhancer.sortable_columns(app.current)) {
        if x >= right {
            break;
        }
        columns.push((x, (*width as u16).min(right - x)));
        x = x.saturating_add(*width as u16 + COLUMN_SPACING);
    }

    TableLayout {
        header_y: area.y + 1,
        columns,
        body_height,
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let position = if app.enhancer.is_empty() {
        " Table 0/0 ".to_string()
    } else {
        format!(" Table {}/{} ", app.current + 1, app.enhancer.len())
    };

    let mut spans = vec![Span::styled(
        position,
        app.style.status_table().add_modifier(Modifier::BOLD),
    )];

    if let Some(table) = app.enhancer.table(app.current) {
        let (shown, hidden) = row_counts(table);
        spans.push(Span::raw(format!(" {} shown, {} hidden", shown, hidden)));

        let header = resolve_header_cells(table, true);
        if let Some((col, state)) = header.sorted_column() {
            let name = header
                .get(col)
                .map(|c| strip_indicator(&c.text()).to_string())
                .unwrap_or_default();
            let direction = if state == SortState::Ascending { "ascending" } else { "descending" };
            spans.push(Span::raw(format!("  sorted by {} {}", name, direction)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(app.style.status_bar()), area);
}

fn render_message_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.message {
        Some(message) if message.is_error => {
            Line::from(Span::styled(message.text.clone(), app.style.message_error()))
        }
        Some(message) => Line::from(Span::styled(message.text.clone(), app.style.message_info())),
        None => Line::from(Span::styled(
            "type to filter  \u{2190}/\u{2192} column  Enter sort  Tab table  Esc quit",
            app.style.filter_placeholder(),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}
