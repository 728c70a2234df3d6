use std::io;
use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::driver::{DriverEvent, Enhancer};
use crate::header::resolve_header_cells;
use crate::sort::{strip_indicator, SortOutcome};
use crate::style::Style;
use crate::ui::{self, TableLayout};

/// Rows moved by one mouse wheel step
const WHEEL_STEP: isize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

pub struct App {
    pub enhancer: Enhancer,
    pub style: Style,
    /// Index of the table on screen
    pub current: usize,
    pub selected_col: usize,
    /// First body row drawn
    pub scroll: usize,
    pub message: Option<Message>,
    pub should_quit: bool,
    layout: TableLayout,
}

impl App {
    pub fn new(enhancer: Enhancer, style: Style) -> Self {
        Self {
            enhancer,
            style,
            current: 0,
            selected_col: 0,
            scroll: 0,
            message: None,
            should_quit: false,
            layout: TableLayout::default(),
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while !self.should_quit {
            let mut layout = TableLayout::default();
            terminal.draw(|f| layout = ui::render(f, self))?;
            self.layout = layout;

            if poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        self.message = None;

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('u') if ctrl => self.set_filter(String::new()),
            KeyCode::Tab => self.switch_table(true),
            KeyCode::BackTab => self.switch_table(false),
            KeyCode::Left => self.selected_col = self.selected_col.saturating_sub(1),
            KeyCode::Right => {
                if self.selected_col + 1 < self.enhancer.sortable_columns(self.current) {
                    self.selected_col += 1;
                }
            }
            KeyCode::Enter => self.click(self.selected_col),
            KeyCode::Up => self.scroll_by(-1),
            KeyCode::Down => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-self.page()),
            KeyCode::PageDown => self.scroll_by(self.page()),
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll_by(isize::MAX / 2),
            KeyCode::Backspace => {
                let mut text = self.filter_value();
                if text.pop().is_some() {
                    self.set_filter(text);
                }
            }
            KeyCode::Char(c) if !ctrl => {
                let mut text = self.filter_value();
                text.push(c);
                self.set_filter(text);
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(col) = self.layout.column_at(mouse.column, mouse.row) {
                    self.message = None;
                    self.selected_col = col;
                    self.click(col);
                }
            }
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_STEP),
            MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_STEP),
            _ => {}
        }
    }

    fn page(&self) -> isize {
        self.layout.body_height.max(1) as isize
    }

    fn filter_value(&self) -> String {
        self.enhancer
            .filter_input(self.current)
            .map(|input| input.value().to_string())
            .unwrap_or_default()
    }

    fn switch_table(&mut self, forward: bool) {
        let count = self.enhancer.len();
        if count < 2 {
            return;
        }
        self.current = if forward {
            (self.current + 1) % count
        } else {
            (self.current + count - 1) % count
        };
        self.selected_col = 0;
        self.scroll = 0;
        debug!(table = self.current + 1, "switched table");
    }

    fn scroll_by(&mut self, delta: isize) {
        let Some(table) = self.enhancer.table(self.current) else {
            return;
        };
        let max = ui::body_rows(table).len().saturating_sub(1);
        let target = (self.scroll as isize).saturating_add(delta).max(0) as usize;
        self.scroll = target.min(max);
    }

    fn click(&mut self, col: usize) {
        let event = self.enhancer.click_header(self.current, col);
        self.report(event);
    }

    fn set_filter(&mut self, text: String) {
        if self.enhancer.is_empty() {
            return;
        }
        let event = self.enhancer.input_filter(self.current, &text);
        self.scroll = 0;
        self.report(event);
    }

    fn column_name(&self, col: usize) -> String {
        self.enhancer
            .table(self.current)
            .and_then(|table| {
                resolve_header_cells(table, true)
                    .get(col)
                    .map(|cell| strip_indicator(&cell.text()).to_string())
            })
            .unwrap_or_default()
    }

    fn report(&mut self, event: DriverEvent) {
        self.message = match event {
            DriverEvent::Sorted(SortOutcome::Sorted { column, ascending, rows, .. }) => {
                let direction = if ascending { "ascending" } else { "descending" };
                Some(Message::info(format!(
                    "Sorted by {} {} ({} rows)",
                    self.column_name(column),
                    direction,
                    rows
                )))
            }
            DriverEvent::Sorted(SortOutcome::Skipped(reason)) => {
                Some(Message::info(format!("Not sorted: {}", reason.describe())))
            }
            DriverEvent::Failed(error) => Some(Message::error(error)),
            DriverEvent::Filtered(_) | DriverEvent::Ignored => None,
        };
    }
}
