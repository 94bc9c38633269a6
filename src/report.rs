use std::{path::Path, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::Error;

static CELL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("cell separator pattern should compile"));

/// A grid of string cells, the first row being the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    cells: Vec<Vec<String>>,
}

impl Table {
    pub fn new(cells: Vec<Vec<String>>) -> Self {
        Self { cells }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.cells.first().map(|x| x.as_slice())
    }

    /// All rows after the header.
    pub fn body(&self) -> &[Vec<String>] {
        self.cells.get(1..).unwrap_or(&[])
    }

    pub fn cells(&self) -> &[Vec<String>] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl From<Vec<Vec<&str>>> for Table {
    fn from(cells: Vec<Vec<&str>>) -> Self {
        Self::new(
            cells
                .into_iter()
                .map(|row| row.into_iter().map(|x| x.to_string()).collect())
                .collect(),
        )
    }
}

/// A model summary report as a sequence of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Report {
    pub fn new(tables: Vec<Table>) -> Self {
        Self {
            title: None,
            tables,
            notes: None,
        }
    }

    pub fn with_title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_notes(mut self, notes: impl ToString) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, index: usize) -> Result<&Table, Error> {
        self.tables.get(index).ok_or(Error::MissingTable {
            index,
            found: self.tables.len(),
        })
    }

    /// Parse the plain text rendering of a summary.
    /// Tables are delimited by lines of `=`, lines of `-` separate a header from the body and
    /// cells are separated by at least two whitespace characters. A row starting with whitespace
    /// has an empty first cell. When the header's first cell is empty, body rows are split from
    /// the right on single whitespace into one cell per labeled column, the rest being the term
    /// name. Text before the first delimiter is the title, text after the last one is the notes.
    /// Every segment between two delimiters is a table, empty ones included, so indices match
    /// the rendered order.
    #[tracing::instrument(skip(text))]
    pub fn from_text(text: &str) -> Self {
        let mut title = None;
        let mut tables = Vec::new();
        let mut segment = Vec::new();
        let mut delimiters = 0;
        for line in text.lines() {
            if !is_rule(line, '=') {
                segment.push(line);
                continue;
            }
            if delimiters == 0 {
                title = join_lines(&segment);
            } else {
                let table = parse_table(&segment);
                debug!("Parsed table {} with {} rows", tables.len(), table.len());
                tables.push(table);
            }
            delimiters += 1;
            segment.clear();
        }
        if delimiters == 0 {
            warn!("No table delimiters found in summary text");
        }
        Self {
            title,
            tables,
            notes: join_lines(&segment),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(text: &str, format: ReportFormat) -> Result<Self, Error> {
        match format {
            ReportFormat::Text => Ok(Self::from_text(text)),
            ReportFormat::Json => Self::from_json(text),
        }
    }

    /// Read a report from a file, the extension selects the format.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let format = ReportFormat::from_path(path)?;
        debug!("Reading {} report from {}", format, path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, format)
    }
}

fn is_rule(line: &str, c: char) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|x| x == c)
}

fn join_lines(lines: &[&str]) -> Option<String> {
    let text = lines
        .iter()
        .map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    if line.starts_with(char::is_whitespace) {
        cells.push(String::new());
    }
    cells.extend(CELL_SEPARATOR.split(line.trim()).map(|x| x.to_string()));
    trace!("Split row into {} cells", cells.len());
    cells
}

/// Split a body row into the term name followed by `values` cells taken from the right.
/// Values never contain whitespace, term names may, and a wide value can sit a single space away
/// from the name.
fn split_labeled(line: &str, values: usize) -> Option<Vec<String>> {
    let mut rest = line.trim();
    let mut cells = Vec::with_capacity(values + 1);
    for _ in 0..values {
        let (head, cell) = rest.rsplit_once(char::is_whitespace)?;
        cells.push(cell.to_string());
        rest = head.trim_end();
    }
    if rest.is_empty() {
        return None;
    }
    cells.push(rest.to_string());
    cells.reverse();
    Some(cells)
}

fn parse_table(lines: &[&str]) -> Table {
    let mut lines = lines
        .iter()
        .filter(|x| !x.trim().is_empty() && !is_rule(x, '-'));
    let Some(header) = lines.next().map(|x| split_cells(x)) else {
        return Table::default();
    };
    let labeled = header.len() > 1 && header[0].is_empty();
    let mut cells = Vec::new();
    for line in lines {
        let row = if labeled && !line.starts_with(char::is_whitespace) {
            split_labeled(line, header.len() - 1).unwrap_or_else(|| split_cells(line))
        } else {
            split_cells(line)
        };
        cells.push(row);
    }
    cells.insert(0, header);
    Table::new(cells)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain text rendering of the summary.
    Text,
    /// Serialized Report type.
    Json,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = path
            .extension()
            .and_then(|x| x.to_str())
            .filter(|x| !x.is_empty())
            .ok_or(Error::NoFileExtension)?;
        Self::from_str(extension)
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    #[cfg_attr(coverage_nightly, coverage(off))]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "txt" | "text" => Self::Text,
            "json" => Self::Json,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

impl std::fmt::Display for ReportFormat {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}
