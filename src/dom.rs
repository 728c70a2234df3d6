//! Live document model for tables
//!
//! Every node is a reference-counted handle. Cloning a handle never copies the
//! node, and `==` on handles compares identity, never content: two cells with
//! the same text in different rows are different cells.

use std::cell::{Cell as Flag, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Sort direction recorded on a header cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortState {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

impl SortState {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortState::Ascending
        } else {
            SortState::Descending
        }
    }

    /// Short name used for export attributes
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            SortState::Unsorted => None,
            SortState::Ascending => Some("asc"),
            SortState::Descending => Some("desc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Head,
    Body,
    Foot,
}

impl SectionKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SectionKind::Head => "thead",
            SectionKind::Body => "tbody",
            SectionKind::Foot => "tfoot",
        }
    }
}

/// One piece of a cell's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Inline element such as `<b>` or `<a>`, flattened to its text
    Element { tag: String, text: String },
}

impl Content {
    pub fn text(&self) -> &str {
        match self {
            Content::Text(text) => text,
            Content::Element { text, .. } => text,
        }
    }
}

struct CellNode {
    header: bool,
    content: RefCell<Vec<Content>>,
    sort_state: Flag<SortState>,
    row: RefCell<Weak<RowNode>>,
}

struct RowNode {
    cells: RefCell<Vec<Cell>>,
    visible: Flag<bool>,
    section: RefCell<Weak<SectionNode>>,
}

struct SectionNode {
    kind: SectionKind,
    rows: RefCell<Vec<Row>>,
}

struct TableNode {
    id: Option<String>,
    head: RefCell<Option<Section>>,
    bodies: RefCell<Vec<Section>>,
    foot: RefCell<Option<Section>>,
}

macro_rules! identity_handle {
    ($name:ident) => {
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}

        impl $name {
            /// Handle identity
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }
    };
}

// === Cell ===

#[derive(Clone)]
pub struct Cell(Rc<CellNode>);

identity_handle!(Cell);

impl Cell {
    fn new(header: bool, content: Vec<Content>) -> Self {
        Self(Rc::new(CellNode {
            header,
            content: RefCell::new(content),
            sort_state: Flag::new(SortState::Unsorted),
            row: RefCell::new(Weak::new()),
        }))
    }

    /// A `th` cell holding plain text
    pub fn header(text: impl Into<String>) -> Self {
        Self::new(true, vec![Content::Text(text.into())])
    }

    /// A `td` cell holding plain text
    pub fn data(text: impl Into<String>) -> Self {
        Self::new(false, vec![Content::Text(text.into())])
    }

    pub fn with_content(header: bool, content: Vec<Content>) -> Self {
        Self::new(header, content)
    }

    pub fn is_header(&self) -> bool {
        self.0.header
    }

    /// Concatenated text of every content piece
    pub fn text(&self) -> String {
        self.0
            .content
            .borrow()
            .iter()
            .map(Content::text)
            .collect()
    }

    /// Replace all content with a single text run. Inline elements are lost.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.0.content.borrow_mut() = vec![Content::Text(text.into())];
    }

    pub fn append_text(&self, text: impl Into<String>) {
        self.0.content.borrow_mut().push(Content::Text(text.into()));
    }

    pub fn append_element(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.0.content.borrow_mut().push(Content::Element {
            tag: tag.into(),
            text: text.into(),
        });
    }

    pub fn contents(&self) -> Vec<Content> {
        self.0.content.borrow().clone()
    }

    pub fn sort_state(&self) -> SortState {
        self.0.sort_state.get()
    }

    pub fn set_sort_state(&self, state: SortState) {
        self.0.sort_state.set(state);
    }

    /// Row currently holding this cell
    pub fn parent(&self) -> Option<Row> {
        self.0.row.borrow().upgrade().map(Row)
    }

    fn set_parent(&self, row: Option<&Row>) {
        *self.0.row.borrow_mut() = row.map(|r| Rc::downgrade(&r.0)).unwrap_or_default();
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_header() { "th" } else { "td" };
        write!(f, "<{}>{:?}", tag, self.text())
    }
}

// === Row ===

#[derive(Clone)]
pub struct Row(Rc<RowNode>);

identity_handle!(Row);

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        let row = Self(Rc::new(RowNode {
            cells: RefCell::new(Vec::with_capacity(cells.len())),
            visible: Flag::new(true),
            section: RefCell::new(Weak::new()),
        }));
        for cell in cells {
            row.append_cell(cell);
        }
        row
    }

    /// Row of plain-text cells, all `th` or all `td`
    pub fn from_texts<S: AsRef<str>>(header: bool, texts: &[S]) -> Self {
        let cells = texts
            .iter()
            .map(|t| {
                if header {
                    Cell::header(t.as_ref())
                } else {
                    Cell::data(t.as_ref())
                }
            })
            .collect();
        Self::new(cells)
    }

    /// Append a cell, moving it out of any row that held it before
    pub fn append_cell(&self, cell: Cell) {
        if let Some(previous) = cell.parent() {
            previous.0.cells.borrow_mut().retain(|c| !c.ptr_eq(&cell));
        }
        cell.set_parent(Some(self));
        self.0.cells.borrow_mut().push(cell);
    }

    pub fn cells(&self) -> Vec<Cell> {
        self.0.cells.borrow().clone()
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.0.cells.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.cells.borrow().is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.0.cells.borrow().iter().map(Cell::text).collect()
    }

    pub fn is_visible(&self) -> bool {
        self.0.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    /// Section currently holding this row
    pub fn parent(&self) -> Option<Section> {
        self.0.section.borrow().upgrade().map(Section)
    }

    fn set_parent(&self, section: Option<&Section>) {
        *self.0.section.borrow_mut() = section
            .map(|s| Rc::downgrade(&s.0))
            .unwrap_or_default();
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.cells.borrow().iter()).finish()
    }
}

// === Section ===

#[derive(Clone)]
pub struct Section(Rc<SectionNode>);

identity_handle!(Section);

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self(Rc::new(SectionNode {
            kind,
            rows: RefCell::new(Vec::new()),
        }))
    }

    pub fn with_rows(kind: SectionKind, rows: Vec<Row>) -> Self {
        let section = Self::new(kind);
        for row in &rows {
            section.append_row(row);
        }
        section
    }

    pub fn kind(&self) -> SectionKind {
        self.0.kind
    }

    pub fn rows(&self) -> Vec<Row> {
        self.0.rows.borrow().clone()
    }

    pub fn row(&self, index: usize) -> Option<Row> {
        self.0.rows.borrow().get(index).cloned()
    }

    pub fn first_row(&self) -> Option<Row> {
        self.row(0)
    }

    pub fn last_row(&self) -> Option<Row> {
        self.0.rows.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.rows.borrow().is_empty()
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.0.rows.borrow().iter().any(|r| r.ptr_eq(row))
    }

    /// Append a row, moving it out of the section that held it before
    pub fn append_row(&self, row: &Row) {
        if let Some(previous) = row.parent() {
            previous.remove_row(row);
        }
        row.set_parent(Some(self));
        self.0.rows.borrow_mut().push(row.clone());
    }

    pub fn remove_row(&self, row: &Row) -> bool {
        let removed = {
            let mut rows = self.0.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|r| !r.ptr_eq(row));
            rows.len() != before
        };
        if removed {
            row.set_parent(None);
        }
        removed
    }

    /// Swap in a complete new row list in one step.
    /// Rows owned by other sections are moved here; rows left out are detached.
    pub fn replace_rows(&self, rows: Vec<Row>) {
        for row in &rows {
            if let Some(previous) = row.parent() {
                if !previous.ptr_eq(self) {
                    previous.remove_row(row);
                }
            }
        }
        let old = std::mem::replace(&mut *self.0.rows.borrow_mut(), rows);
        for row in &old {
            if !self.contains(row) {
                row.set_parent(None);
            }
        }
        for row in self.rows() {
            row.set_parent(Some(self));
        }
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.kind().tag())
            .field("rows", &self.0.rows.borrow())
            .finish()
    }
}

// === Table ===

#[derive(Clone)]
pub struct Table(Rc<TableNode>);

identity_handle!(Table);

impl Table {
    pub fn new(id: Option<String>) -> Self {
        Self(Rc::new(TableNode {
            id,
            head: RefCell::new(None),
            bodies: RefCell::new(Vec::new()),
            foot: RefCell::new(None),
        }))
    }

    pub fn id(&self) -> Option<&str> {
        self.0.id.as_deref()
    }

    pub fn head(&self) -> Option<Section> {
        self.0.head.borrow().clone()
    }

    pub fn set_head(&self, section: Section) {
        *self.0.head.borrow_mut() = Some(section);
    }

    pub fn bodies(&self) -> Vec<Section> {
        self.0.bodies.borrow().clone()
    }

    pub fn first_body(&self) -> Option<Section> {
        self.0.bodies.borrow().first().cloned()
    }

    pub fn add_body(&self, section: Section) {
        self.0.bodies.borrow_mut().push(section);
    }

    pub fn foot(&self) -> Option<Section> {
        self.0.foot.borrow().clone()
    }

    pub fn set_foot(&self, section: Section) {
        *self.0.foot.borrow_mut() = Some(section);
    }

    /// Every section in document order
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        sections.extend(self.head());
        sections.extend(self.bodies());
        sections.extend(self.foot());
        sections
    }

    /// Every row in document order: head, bodies, foot
    pub fn rows(&self) -> Vec<Row> {
        self.sections().iter().flat_map(Section::rows).collect()
    }

    pub fn first_row(&self) -> Option<Row> {
        self.sections().iter().find_map(Section::first_row)
    }

    pub fn col_count(&self) -> usize {
        self.rows().iter().map(Row::len).max().unwrap_or(0)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("table")
            .field("id", &self.id())
            .field("sections", &self.sections())
            .finish()
    }
}

/// Tables discovered in one source document
#[derive(Debug, Clone, Default)]
pub struct Document {
    tables: Vec<Table>,
}

impl Document {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn push(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_compare_by_identity() {
        let a = Cell::data("x");
        let b = Cell::data("x");
        assert_eq!(a.text(), b.text());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn cells_know_their_row() {
        let row = Row::from_texts(false, &["a", "b"]);
        let cell = row.cell(1).unwrap();
        assert_eq!(cell.parent(), Some(row.clone()));
    }

    #[test]
    fn append_row_moves_between_sections() {
        let first = Section::new(SectionKind::Body);
        let second = Section::new(SectionKind::Body);
        let row = Row::from_texts(false, &["a"]);

        first.append_row(&row);
        second.append_row(&row);

        assert!(first.is_empty());
        assert_eq!(second.len(), 1);
        assert_eq!(row.parent(), Some(second));
    }

    #[test]
    fn replace_rows_detaches_dropped_rows() {
        let body = Section::new(SectionKind::Body);
        let keep = Row::from_texts(false, &["keep"]);
        let dropped = Row::from_texts(false, &["drop"]);
        body.append_row(&keep);
        body.append_row(&dropped);

        body.replace_rows(vec![keep.clone()]);

        assert_eq!(body.rows(), vec![keep.clone()]);
        assert_eq!(keep.parent(), Some(body));
        assert!(dropped.parent().is_none());
    }

    #[test]
    fn set_text_drops_inline_elements() {
        let cell = Cell::header("Name ");
        cell.append_element("img", "");
        cell.append_element("b", "!");
        assert_eq!(cell.text(), "Name !");
        assert_eq!(cell.contents().len(), 3);

        cell.set_text("Name");
        assert_eq!(cell.contents(), vec![Content::Text("Name".to_string())]);
    }

    #[test]
    fn table_rows_in_document_order() {
        let table = Table::new(Some("t".to_string()));
        table.add_body(Section::with_rows(
            SectionKind::Body,
            vec![Row::from_texts(false, &["body"])],
        ));
        table.set_foot(Section::with_rows(
            SectionKind::Foot,
            vec![Row::from_texts(false, &["foot"])],
        ));
        table.set_head(Section::with_rows(
            SectionKind::Head,
            vec![Row::from_texts(true, &["head"])],
        ));

        let texts: Vec<String> = table.rows().iter().map(|r| r.texts().join("")).collect();
        assert_eq!(texts, vec!["head", "body", "foot"]);
        assert_eq!(table.id(), Some("t"));
        assert_eq!(table.first_row().unwrap().texts(), vec!["head"]);
    }
}
