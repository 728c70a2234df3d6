use std::io::Write;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::dom::{Cell, Content, Document, Row, Section, SectionKind, Table};
use crate::error::{EnhanceError, Result};

const HIDDEN_STYLE: &str = "display: none";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EnhanceError::Selector(format!("{css}: {e:?}")))
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

fn is_hidden(element: &ElementRef) -> bool {
    element
        .value()
        .attr("style")
        .map(|style| style.replace(' ', "").contains("display:none"))
        .unwrap_or(false)
}

fn parse_cell(element: ElementRef) -> Cell {
    let mut content = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => content.push(Content::Text(String::from(&**text))),
            Node::Element(inline) => {
                if let Some(inline_ref) = ElementRef::wrap(child) {
                    content.push(Content::Element {
                        tag: inline.name().to_string(),
                        text: inline_ref.text().collect(),
                    });
                }
            }
            _ => {}
        }
    }
    Cell::with_content(element.value().name() == "th", content)
}

fn parse_row(element: ElementRef) -> Row {
    let row = Row::new(
        child_elements(element)
            .filter(|e| matches!(e.value().name(), "th" | "td"))
            .map(parse_cell)
            .collect(),
    );
    if is_hidden(&element) {
        row.set_visible(false);
    }
    row
}

fn parse_section(element: ElementRef, kind: SectionKind) -> Section {
    Section::with_rows(
        kind,
        child_elements(element)
            .filter(|e| e.value().name() == "tr")
            .map(parse_row)
            .collect(),
    )
}

fn parse_table(element: ElementRef) -> Table {
    let table = Table::new(element.value().attr("id").map(str::to_string));
    // rows sitting directly under <table> share one implicit body
    let mut loose: Option<Section> = None;

    for child in child_elements(element) {
        match child.value().name() {
            "thead" => {
                let section = parse_section(child, SectionKind::Head);
                match table.head() {
                    Some(head) => {
                        for row in section.rows() {
                            head.append_row(&row);
                        }
                    }
                    None => table.set_head(section),
                }
            }
            "tbody" => table.add_body(parse_section(child, SectionKind::Body)),
            "tfoot" => table.set_foot(parse_section(child, SectionKind::Foot)),
            "tr" => {
                let body = loose.get_or_insert_with(|| {
                    let body = Section::new(SectionKind::Body);
                    table.add_body(body.clone());
                    body
                });
                body.append_row(&parse_row(child));
            }
            _ => {}
        }
    }
    table
}

/// Every `<table>` of an HTML document, outer tables before the tables nested in them
pub fn parse_html(source: &str) -> Result<Document> {
    let html = Html::parse_document(source);
    let tables = selector("table")?;

    let document = Document::new(html.select(&tables).map(parse_table).collect());
    debug!(tables = document.len(), "parsed html");
    Ok(document)
}

// === Export ===

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_cell<W: Write>(cell: &Cell, writer: &mut W) -> Result<()> {
    let tag = if cell.is_header() { "th" } else { "td" };
    write!(writer, "      <{tag}")?;
    if let Some(direction) = cell.sort_state().as_attr() {
        write!(writer, " data-sort-direction=\"{direction}\"")?;
    }
    write!(writer, ">")?;
    for piece in cell.contents() {
        match piece {
            Content::Text(text) => write!(writer, "{}", escape(&text))?,
            Content::Element { tag, text } => {
                write!(writer, "<{tag}>{}</{tag}>", escape(&text))?
            }
        }
    }
    writeln!(writer, "</{tag}>")?;
    Ok(())
}

fn write_section<W: Write>(section: &Section, writer: &mut W) -> Result<()> {
    let tag = section.kind().tag();
    writeln!(writer, "  <{tag}>")?;
    for row in section.rows() {
        if row.is_visible() {
            writeln!(writer, "    <tr>")?;
        } else {
            writeln!(writer, "    <tr style=\"{HIDDEN_STYLE}\">")?;
        }
        for cell in row.cells() {
            write_cell(&cell, writer)?;
        }
        writeln!(writer, "    </tr>")?;
    }
    writeln!(writer, "  </{tag}>")?;
    Ok(())
}

/// Write `tables` as HTML. Hidden rows are kept but styled invisible.
pub fn export_html<W: Write>(tables: &[Table], mut writer: W) -> Result<()> {
    for table in tables {
        match table.id() {
            Some(id) => writeln!(writer, "<table id=\"{}\">", escape(id))?,
            None => writeln!(writer, "<table>")?,
        }
        for section in table.sections() {
            write_section(&section, &mut writer)?;
        }
        writeln!(writer, "</table>")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_rows;
    use crate::driver::{Enhancer, DEFAULT_PLACEHOLDER};
    use crate::header::resolve_header_cells;

    const PAGE: &str = r#"
        <html><body>
        <p>intro</p>
        <table id="fruit">
          <thead><tr><th>Name</th><th>Qty</th></tr></thead>
          <tbody>
            <tr><td><b>Pear</b> (ripe)</td><td>3</td></tr>
            <tr><td>Fig</td><td>12</td></tr>
          </tbody>
          <tfoot><tr><td>Total</td><td>15</td></tr></tfoot>
        </table>
        <table>
          <tr><th>City</th></tr>
          <tr><td>Oslo &amp; Bergen</td></tr>
        </table>
        </body></html>
    "#;

    fn export_string(tables: &[Table]) -> String {
        let mut out = Vec::new();
        export_html(tables, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_sections_and_inline_content() {
        let document = parse_html(PAGE).unwrap();
        assert_eq!(document.len(), 2);

        let fruit = document.table(0).unwrap();
        assert_eq!(fruit.id(), Some("fruit"));
        assert_eq!(fruit.head().unwrap().len(), 1);
        assert_eq!(fruit.first_body().unwrap().len(), 2);
        assert_eq!(fruit.foot().unwrap().len(), 1);

        let pear = fruit.first_body().unwrap().first_row().unwrap().cell(0).unwrap();
        assert!(!pear.is_header());
        assert_eq!(pear.text(), "Pear (ripe)");
        assert_eq!(
            pear.contents()[0],
            Content::Element { tag: "b".to_string(), text: "Pear".to_string() }
        );
    }

    #[test]
    fn test_rows_without_sections_give_embedded_header() {
        let document = parse_html(PAGE).unwrap();
        let city = document.table(1).unwrap();

        // the parser wraps loose rows in a tbody
        assert!(city.head().is_none());
        let header = resolve_header_cells(city, true);
        assert_eq!(header.texts(), vec!["City"]);
        let partition = classify_rows(city, &header);
        assert!(partition.embedded_header.is_some());
        assert_eq!(partition.data_rows[0].texts(), vec!["Oslo & Bergen"]);
    }

    #[test]
    fn test_nested_tables_are_found() {
        let source = "<table><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>";
        let document = parse_html(source).unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(document.table(1).unwrap().first_row().unwrap().texts(), vec!["inner"]);
    }

    #[test]
    fn test_hidden_rows_survive_a_round_trip() {
        let document = parse_html(PAGE).unwrap();
        let mut enhancer = Enhancer::activate(document, DEFAULT_PLACEHOLDER);
        enhancer.input_filter(0, "fig");
        enhancer.click_header(0, 1);

        let html = export_string(enhancer.document().tables());
        assert!(html.contains("<table id=\"fruit\">"));
        assert!(html.contains("<th data-sort-direction=\"asc\">Qty ^</th>"));
        assert!(html.contains("<tr style=\"display: none\">"));
        assert!(html.contains("<td><b>Pear</b> (ripe)</td>"));
        assert!(html.contains("Oslo &amp; Bergen"));

        let reloaded = parse_html(&html).unwrap();
        let body = reloaded.table(0).unwrap().first_body().unwrap();
        let visible: Vec<bool> = body.rows().iter().map(|r| r.is_visible()).collect();
        // ascending by quantity: pear (3) is hidden, fig (12) is shown
        assert_eq!(visible, vec![false, true]);
    }

    #[test]
    fn test_no_tables() {
        let document = parse_html("<p>nothing here</p>").unwrap();
        assert!(document.is_empty());
        assert_eq!(export_string(document.tables()), "");
    }
}
