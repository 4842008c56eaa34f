//! CSV reader: the whole file becomes a single table.
//!
//! The first record is the header row. Each cell is one paragraph whose style
//! depends on the row kind and on what the cell holds: right-to-left text
//! gets the ` (RTL)` variant, a bare number the ` (Number)` variant.

use crate::error::SourceError;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tagpress_idf::{Cell, Node, Paragraph, Row, Table};
use tagpress_traits::DocumentSource;
use tagpress_types::{DocumentProperties, Realm, StyleDecl};

pub const TABLE_STYLE: &str = "Spreadsheet";
pub const HEADER_STYLE: &str = "Spreadsheet Header";
pub const BODY_STYLE: &str = "Spreadsheet Body";

static RTL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{0591}-\u{05F4}\u{0600}-\u{06FF}]").expect("BUG: invalid RTL regex")
});
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*\.?\d+$").expect("BUG: invalid number regex"));

fn rtl(style: &str) -> String {
    format!("{} (RTL)", style)
}

fn number(style: &str) -> String {
    format!("{} (Number)", style)
}

/// The paragraph style for a cell holding `text`.
fn cell_style(row_style: &str, text: &str) -> String {
    if RTL_RE.is_match(text) {
        rtl(row_style)
    } else if NUMBER_RE.is_match(text) {
        number(row_style)
    } else {
        row_style.to_string()
    }
}

/// Which columns of the spreadsheet to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnSelection {
    #[default]
    All,
    /// The first `n` columns.
    First(usize),
    /// These columns, 1-based, in this order.
    Indexes(Vec<usize>),
}

impl ColumnSelection {
    /// Zero-based column indexes to keep out of `available`.
    fn resolve(&self, available: usize) -> Result<Vec<usize>, SourceError> {
        match self {
            ColumnSelection::All => Ok((0..available).collect()),
            ColumnSelection::First(n) => Ok((0..(*n).min(available)).collect()),
            ColumnSelection::Indexes(indexes) => indexes
                .iter()
                .map(|&index| {
                    if index == 0 || index > available {
                        Err(SourceError::ColumnOutOfRange { index, available })
                    } else {
                        Ok(index - 1)
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    name: String,
    nodes: Vec<Node>,
}

impl SpreadsheetSource {
    pub fn open(path: &Path, columns: &ColumnSelection) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
        Self::from_reader(path.display().to_string(), file, columns)
    }

    pub fn from_reader<R: Read>(
        name: impl Into<String>,
        input: R,
        columns: &ColumnSelection,
    ) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let keep = columns.resolve(headers.len())?;
        log::debug!("Using {} of {} columns", keep.len(), headers.len());

        let row = |record: &csv::StringRecord, style: &str| {
            let cells = keep
                .iter()
                .map(|&index| {
                    let text = record.get(index).unwrap_or_default().trim();
                    Cell::new(Paragraph::styled(cell_style(style, text)).with_text(text))
                })
                .collect();
            Row::new(cells)
        };

        let mut table = Table::new(Some(TABLE_STYLE))
            .with_header_rows(1)
            .with_row(row(&headers, HEADER_STYLE));
        for record in reader.records() {
            table = table.with_row(row(&record?, BODY_STYLE));
        }

        Ok(Self {
            name: name.into(),
            nodes: vec![table.into()],
        })
    }
}

impl DocumentSource for SpreadsheetSource {
    fn properties(&self) -> DocumentProperties {
        DocumentProperties::default()
    }

    fn style_definitions(&self) -> Vec<StyleDecl> {
        let variants: [fn(&str) -> String; 3] = [|style| style.to_string(), rtl, number];
        let mut decls =
            vec![StyleDecl::in_realm(Realm::Table, TABLE_STYLE).with_internal_name(TABLE_STYLE)];
        for variant in variants {
            for row_style in [HEADER_STYLE, BODY_STYLE] {
                let local_id = variant(row_style);
                decls.push(
                    StyleDecl::in_realm(Realm::Paragraph, local_id.clone())
                        .with_internal_name(local_id),
                );
            }
        }
        decls
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn name(&self) -> &str {
        &self.name
    }
}
