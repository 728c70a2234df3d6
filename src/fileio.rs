use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::HeaderPlacement;
use crate::dom::{Document, Row, Section, SectionKind, Table};
use crate::error::{EnhanceError, Result};

mod html;

pub use html::{export_html, parse_html};

/// Detected file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Html,
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(FileFormat::Html),
            "csv" => Some(FileFormat::Csv),
            "tsv" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "html" | "htm" => Some(FileFormat::Html),
            "csv" => Some(FileFormat::Csv),
            "tsv" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    /// Get the delimiter for CSV-like formats
    fn delimiter(&self) -> Option<u8> {
        match self {
            FileFormat::Csv => Some(b','),
            FileFormat::Tsv => Some(b'\t'),
            FileFormat::Html => None,
        }
    }
}

/// How delimited files become tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub header_rows: usize,
    pub header_placement: HeaderPlacement,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header_rows: 1,
            header_placement: HeaderPlacement::Section,
        }
    }
}

/// Result of loading a file, including any warnings
pub struct LoadResult {
    pub document: Document,
    pub warnings: Vec<String>,
}

pub struct FileIO {
    pub file_path: PathBuf,
    format: FileFormat,
    options: LoadOptions,
}

impl FileIO {
    /// Unknown extensions are read as CSV unless `format` says otherwise
    pub fn new(file_path: PathBuf, format: Option<FileFormat>, options: LoadOptions) -> Self {
        let format = format
            .or_else(|| FileFormat::from_extension(&file_path))
            .unwrap_or(FileFormat::Csv);
        Self { file_path, format, options }
    }

    pub fn file_name(&self) -> String {
        self.file_path.display().to_string()
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Build the live document from the file
    pub fn load_document(&self) -> Result<LoadResult> {
        let file = File::open(&self.file_path)?;
        let mut reader = BufReader::with_capacity(1 << 20, file); // 1 MB

        let result = match self.format {
            FileFormat::Html => {
                let mut source = String::new();
                reader.read_to_string(&mut source)?;
                LoadResult {
                    document: parse_html(&source)?,
                    warnings: Vec::new(),
                }
            }
            FileFormat::Csv | FileFormat::Tsv => {
                let delim = self.format.delimiter().unwrap_or(b',');
                read_delimited(reader, delim, self.options)?
            }
        };

        info!(
            file = %self.file_name(),
            tables = result.document.len(),
            "document loaded"
        );
        Ok(result)
    }
}

// === CSV/TSV ===

/// Read delimited records into a single table.
///
/// The first `header_rows` records become header rows, placed according to
/// `options.header_placement`. Short rows are padded to the widest row.
pub fn read_delimited<R: Read>(reader: R, delim: u8, options: LoadOptions) -> Result<LoadResult> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(reader);

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut max_cols: usize = 0;
    let mut needs_padding = false;

    for result in csv_reader.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

        // Track if padding will be needed
        if row.len() > max_cols {
            if max_cols > 0 {
                needs_padding = true;
            }
            max_cols = row.len();
        } else if row.len() < max_cols {
            needs_padding = true;
        }

        records.push(row);
    }

    let mut warnings = Vec::new();

    if needs_padding {
        warnings.push(format!(
            "Padded rows with empty cells (max width: {} columns)",
            max_cols
        ));
        for row in records.iter_mut() {
            if row.len() < max_cols {
                row.resize(max_cols, String::new());
            }
        }
    }

    let header_count = options.header_rows.min(records.len());
    let header_rows: Vec<Row> = records[..header_count]
        .iter()
        .map(|r| Row::from_texts(true, r))
        .collect();
    let data_rows = records[header_count..]
        .iter()
        .map(|r| Row::from_texts(false, r));

    let table = Table::new(None);
    let body = Section::new(SectionKind::Body);
    match options.header_placement {
        HeaderPlacement::Section if !header_rows.is_empty() => {
            table.set_head(Section::with_rows(SectionKind::Head, header_rows));
        }
        _ => {
            for row in &header_rows {
                body.append_row(row);
            }
        }
    }
    for row in data_rows {
        body.append_row(&row);
    }
    table.add_body(body);

    Ok(LoadResult {
        document: Document::new(vec![table]),
        warnings,
    })
}

/// Write the visible rows of `table` in document order
pub fn write_delimited<W: Write>(table: &Table, writer: W, delim: u8) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delim)
        .flexible(true)
        .from_writer(writer);

    for row in table.rows().iter().filter(|r| r.is_visible()) {
        csv_writer.write_record(row.texts())?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Visible rows of `table` as comma separated values
pub fn export_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    write_delimited(table, writer, b',')
}

/// Export the document, or the single table at `table` (0-based), to `writer`.
/// Delimited formats hold one table and default to the first.
pub fn export<W: Write>(
    document: &Document,
    format: FileFormat,
    table: Option<usize>,
    writer: W,
) -> Result<()> {
    let selected: Vec<Table> = match table {
        Some(index) => vec![document
            .table(index)
            .cloned()
            .ok_or(EnhanceError::NoSuchTable(index + 1))?],
        None => document.tables().to_vec(),
    };

    match format {
        FileFormat::Html => export_html(&selected, writer),
        FileFormat::Csv | FileFormat::Tsv => {
            let first = selected.first().ok_or_else(|| {
                EnhanceError::Io(io::Error::new(io::ErrorKind::NotFound, "no table to export"))
            })?;
            write_delimited(first, writer, format.delimiter().unwrap_or(b','))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::filter::filter;
    use crate::header::resolve_header_cells;
    use crate::classify::classify_rows;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension(Path::new("t.csv")), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension(Path::new("t.TSV")), Some(FileFormat::Tsv));
        assert_eq!(FileFormat::from_extension(Path::new("t.htm")), Some(FileFormat::Html));
        assert_eq!(FileFormat::from_extension(Path::new("t.txt")), None);
        assert_eq!(FileFormat::from_name("HTML"), Some(FileFormat::Html));
    }

    #[test]
    fn test_csv_header_in_section() {
        let data = "name,qty\npear,3\nfig,12\n";
        let result = read_delimited(data.as_bytes(), b',', LoadOptions::default()).unwrap();
        let table = result.document.table(0).unwrap();

        assert_eq!(table.head().unwrap().len(), 1);
        assert_eq!(table.first_body().unwrap().len(), 2);
        let header = resolve_header_cells(table, true);
        assert_eq!(header.texts(), vec!["name", "qty"]);
        assert!(classify_rows(table, &header).embedded_header.is_none());
    }

    #[test]
    fn test_csv_header_in_body() {
        let options = LoadOptions {
            header_rows: 1,
            header_placement: HeaderPlacement::Body,
        };
        let data = "name,qty\npear,3\n";
        let result = read_delimited(data.as_bytes(), b',', options).unwrap();
        let table = result.document.table(0).unwrap();

        assert!(table.head().is_none());
        let header = resolve_header_cells(table, true);
        let partition = classify_rows(table, &header);
        assert!(partition.embedded_header.is_some());
        assert_eq!(partition.data_rows.len(), 1);
    }

    #[test]
    fn test_csv_without_header() {
        let options = LoadOptions {
            header_rows: 0,
            header_placement: HeaderPlacement::Section,
        };
        let result = read_delimited("1,2\n3,4\n".as_bytes(), b',', options).unwrap();
        let table = result.document.table(0).unwrap();
        assert!(table.head().is_none());
        // the first row still acts as the header
        let header = resolve_header_cells(table, true);
        assert!(classify_rows(table, &header).embedded_header.is_some());
    }

    #[test]
    fn test_csv_padding_warning() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2").unwrap(); // Short row
        writeln!(file, "3,4,5").unwrap();

        let file_io = FileIO::new(file.path().to_path_buf(), None, LoadOptions::default());
        assert_eq!(file_io.format(), FileFormat::Csv);
        let result = file_io.load_document().unwrap();

        let table = result.document.table(0).unwrap();
        assert_eq!(table.col_count(), 3);
        assert!(!result.warnings.is_empty());
        assert!(result.warnings[0].contains("Padded"));
    }

    #[test]
    fn test_tsv_file() {
        let mut file = NamedTempFile::with_suffix(".tsv").unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "x y\tz").unwrap();

        let file_io = FileIO::new(file.path().to_path_buf(), None, LoadOptions::default());
        let result = file_io.load_document().unwrap();
        let body = result.document.table(0).unwrap().first_body().unwrap();
        assert_eq!(body.first_row().unwrap().texts(), vec!["x y", "z"]);
    }

    #[test]
    fn test_empty_csv() {
        let result = read_delimited("".as_bytes(), b',', LoadOptions::default()).unwrap();
        let table = result.document.table(0).unwrap();
        assert!(table.rows().is_empty());
        assert!(resolve_header_cells(table, true).is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let file_io = FileIO::new(
            PathBuf::from("/nonexistent/table.csv"),
            None,
            LoadOptions::default(),
        );
        assert!(matches!(file_io.load_document(), Err(EnhanceError::Io(_))));
    }

    #[test]
    fn test_csv_export_skips_hidden_rows() {
        let data = "name,qty\npear,3\nfig,12\n";
        let result = read_delimited(data.as_bytes(), b',', LoadOptions::default()).unwrap();
        let table = result.document.table(0).unwrap();
        filter(table, "fig");

        let mut out = Vec::new();
        export(&result.document, FileFormat::Csv, None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "name,qty\nfig,12\n");
    }

    #[test]
    fn test_export_unknown_table() {
        let result = read_delimited("a\n".as_bytes(), b',', LoadOptions::default()).unwrap();
        let err = export(&result.document, FileFormat::Html, Some(4), Vec::new()).unwrap_err();
        assert!(matches!(err, EnhanceError::NoSuchTable(5)));
    }
}
