//! Intermediate Document Format (IDF)
//!
//! The reader-neutral representation of a document body: paragraphs and
//! tables, whose paragraphs hold chunks (text spans, images, formulas), and
//! whose spans may carry footnotes and comments. Style references are the
//! document-local ids; resolving them is the style registry's business.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tagpress_types::{ManualFormat, Realm, StyleMention};

pub type TextStr = String;

/// A reference-counted container for shared, immutable data like images.
pub type SharedData = Arc<Vec<u8>>;

/// A top-level body element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Paragraph(Paragraph),
    Table(Table),
}

impl From<Paragraph> for Node {
    fn from(p: Paragraph) -> Self {
        Node::Paragraph(p)
    }
}

impl From<Table> for Node {
    fn from(t: Table) -> Self {
        Node::Table(t)
    }
}

/// A paragraph: an optional style reference and a sequence of chunks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    pub style: Option<TextStr>,
    pub format: ManualFormat,
    /// The paragraph is (or ends with) a hard page break.
    pub page_break: bool,
    pub chunks: Vec<Chunk>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(style: impl Into<TextStr>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: ManualFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_page_break(mut self) -> Self {
        self.page_break = true;
        self
    }

    /// Appends an unstyled span holding `text`.
    pub fn with_text(self, text: impl Into<TextStr>) -> Self {
        self.with_span(Span::new(text))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.chunks.push(Chunk::Span(span));
        self
    }

    pub fn with_chunk(mut self, chunk: Chunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            Chunk::Span(span) => Some(span),
            _ => None,
        })
    }

    /// The plain text of all spans, without footnotes.
    pub fn text(&self) -> String {
        self.spans().flat_map(|span| span.text.iter()).map(String::as_str).collect()
    }

    /// True if the paragraph has no visible text and no embedded objects.
    pub fn is_blank(&self) -> bool {
        self.chunks.iter().all(|chunk| match chunk {
            Chunk::Span(span) => span.text.iter().all(|t| t.trim().is_empty()),
            Chunk::Image(_) | Chunk::Formula(_) => false,
        })
    }
}

/// One piece of paragraph content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chunk {
    Span(Span),
    Image(Image),
    Formula(Formula),
}

/// A run of text sharing one character style and manual format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    pub style: Option<TextStr>,
    pub format: ManualFormat,
    pub text: Vec<TextStr>,
    pub footnotes: Vec<Note>,
    pub comments: Vec<Note>,
}

impl Span {
    pub fn new(text: impl Into<TextStr>) -> Self {
        Self {
            text: vec![text.into()],
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<TextStr>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_format(mut self, format: ManualFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_footnote(mut self, note: Note) -> Self {
        self.footnotes.push(note);
        self
    }

    pub fn with_comment(mut self, note: Note) -> Self {
        self.comments.push(note);
        self
    }
}

/// The body of a footnote or comment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Note {
    pub paragraphs: Vec<Paragraph>,
}

impl Note {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }
}

/// An embedded picture, carried as raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// File suffix including the dot, e.g. `.png`.
    pub suffix: TextStr,
    pub data: SharedData,
}

/// An embedded formula in MathML form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub mathml: TextStr,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub style: Option<TextStr>,
    pub format: ManualFormat,
    pub header_rows: usize,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(style: Option<&str>) -> Self {
        Self {
            style: style.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    /// `(rows, columns)`, counting column spans.
    pub fn shape(&self) -> (usize, usize) {
        let cols = self
            .rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| cell.cols.max(1)).sum::<usize>())
            .max()
            .unwrap_or(0);
        (self.rows.len(), cols)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default = "one")]
    pub rows: usize,
    #[serde(default = "one")]
    pub cols: usize,
    pub contents: Paragraph,
}

fn one() -> usize {
    1
}

impl Cell {
    pub fn new(contents: Paragraph) -> Self {
        Self {
            rows: 1,
            cols: 1,
            contents,
        }
    }

    pub fn with_span(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }
}

/// Collects every style reference in `nodes`, in first-seen order, without duplicates.
pub fn style_mentions<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<StyleMention> {
    let mut mentions = Vec::new();
    for node in nodes {
        match node {
            Node::Paragraph(para) => paragraph_mentions(para, &mut mentions),
            Node::Table(table) => {
                push_mention(&mut mentions, Realm::Table, table.style.as_deref());
                for cell in table.rows.iter().flat_map(|row| row.cells.iter()) {
                    paragraph_mentions(&cell.contents, &mut mentions);
                }
            }
        }
    }
    mentions
}

fn paragraph_mentions(para: &Paragraph, out: &mut Vec<StyleMention>) {
    push_mention(out, Realm::Paragraph, para.style.as_deref());
    for span in para.spans() {
        push_mention(out, Realm::Character, span.style.as_deref());
        for note in span.footnotes.iter().chain(span.comments.iter()) {
            for inner in &note.paragraphs {
                paragraph_mentions(inner, out);
            }
        }
    }
}

fn push_mention(out: &mut Vec<StyleMention>, realm: Realm, id: Option<&str>) {
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return;
    };
    if !out.iter().any(|m| m.realm == realm && m.local_id == id) {
        out.push(StyleMention::new(realm, id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text_and_blankness() {
        let para = Paragraph::styled("Body")
            .with_text("Hello, ")
            .with_span(Span::new("world").with_style("Emphasis"));
        assert_eq!(para.text(), "Hello, world");
        assert!(!para.is_blank());
        assert!(Paragraph::new().with_text("  \t").is_blank());
        assert!(Paragraph::new().is_blank());
    }

    #[test]
    fn test_image_is_not_blank() {
        let para = Paragraph::new().with_chunk(Chunk::Image(Image {
            suffix: ".png".into(),
            data: Arc::new(vec![1, 2, 3]),
        }));
        assert!(!para.is_blank());
    }

    #[test]
    fn test_table_shape_counts_spans() {
        let table = Table::new(Some("Grid"))
            .with_row(Row::new(vec![Cell::new(Paragraph::new()).with_span(1, 3)]))
            .with_row(Row::new(vec![Cell::new(Paragraph::new()), Cell::new(Paragraph::new())]));
        assert_eq!(table.shape(), (2, 3));
    }

    #[test]
    fn test_style_mentions_walks_notes_and_tables() {
        let footnote = Note::new(vec![Paragraph::styled("Footnote Text")]);
        let nodes = vec![
            Node::from(
                Paragraph::styled("Body")
                    .with_span(Span::new("x").with_style("Strong").with_footnote(footnote)),
            ),
            Node::from(Table::new(Some("Grid")).with_row(Row::new(vec![Cell::new(
                Paragraph::styled("Body"),
            )]))),
        ];
        let mentions = style_mentions(&nodes);
        assert_eq!(
            mentions,
            vec![
                StyleMention::new(Realm::Paragraph, "Body"),
                StyleMention::new(Realm::Character, "Strong"),
                StyleMention::new(Realm::Paragraph, "Footnote Text"),
                StyleMention::new(Realm::Table, "Grid"),
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let json = r#"[
            {"kind": "paragraph", "style": "Body", "chunks": [
                {"kind": "span", "text": ["Hi"], "format": "BOLD"}
            ]},
            {"kind": "table", "rows": [{"cells": [{"contents": {"chunks": []}}]}]}
        ]"#;
        let nodes: Vec<Node> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes.len(), 2);
        let Node::Paragraph(para) = &nodes[0] else {
            panic!("expected a paragraph");
        };
        assert_eq!(para.spans().next().map(|s| s.format), Some(ManualFormat::BOLD));
        let Node::Table(table) = &nodes[1] else {
            panic!("expected a table");
        };
        assert_eq!(table.rows[0].cells[0].cols, 1);
    }
}
