//! CommonMark reader (via comrak).
//!
//! Blocks map to paragraph styles named after the Markdown construct
//! (`normal`, `heading 2`, `list item`, ...), inline markup to character
//! styles (`emphasis`, `strong`, `link`, `code`).

use crate::error::SourceError;
use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagpress_idf::{Cell, Chunk, Image, Node, Note, Paragraph, Row, Span, Table, style_mentions};
use tagpress_traits::DocumentSource;
use tagpress_types::{DocumentProperties, ManualFormat, Realm, StyleDecl};

pub const NORMAL_STYLE: &str = "normal";
pub const LIST_ITEM_STYLE: &str = "list item";
pub const BLOCK_QUOTE_STYLE: &str = "block quote";
pub const CODE_BLOCK_STYLE: &str = "code block";
pub const TABLE_STYLE: &str = "table";
pub const TABLE_CELL_STYLE: &str = "table cell";
pub const EMPHASIS_STYLE: &str = "emphasis";
pub const STRONG_STYLE: &str = "strong";
pub const LINK_STYLE: &str = "link";
pub const CODE_STYLE: &str = "code";

fn heading_style(level: u8) -> String {
    format!("heading {}", level)
}

/// Formatting a character style implies.
fn style_format(realm: Realm, local_id: &str) -> ManualFormat {
    match (realm, local_id) {
        (Realm::Character, EMPHASIS_STYLE) => ManualFormat::ITALIC,
        (Realm::Character, STRONG_STYLE) => ManualFormat::BOLD,
        _ => ManualFormat::NORMAL,
    }
}

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.strikethrough = true;
    options
}

#[derive(Debug, Clone)]
pub struct MarkdownSource {
    name: String,
    nodes: Vec<Node>,
}

impl MarkdownSource {
    /// Reads a Markdown file. Images are loaded relative to its directory.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::parse(path.display().to_string(), &text, base_dir))
    }

    pub fn parse(name: impl Into<String>, text: &str, base_dir: impl Into<PathBuf>) -> Self {
        let arena = Arena::new();
        let root = parse_document(&arena, text, &comrak_options());
        let mut builder = Builder {
            base_dir: base_dir.into(),
            footnotes: HashMap::new(),
        };
        builder.collect_footnotes(root);
        let mut nodes = Vec::new();
        for child in root.children() {
            builder.block(child, None, &mut nodes);
        }
        Self {
            name: name.into(),
            nodes,
        }
    }
}

impl DocumentSource for MarkdownSource {
    fn properties(&self) -> DocumentProperties {
        DocumentProperties {
            has_rtl: false,
            pure_ascii: false,
        }
    }

    /// Every style the document uses, declared custom so that the formatting
    /// it implies is not synthesized again.
    fn style_definitions(&self) -> Vec<StyleDecl> {
        style_mentions(&self.nodes)
            .into_iter()
            .map(|mention| {
                let format = style_format(mention.realm, &mention.local_id);
                StyleDecl::in_realm(mention.realm, mention.local_id)
                    .with_format(format)
                    .custom()
            })
            .collect()
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct Builder {
    base_dir: PathBuf,
    footnotes: HashMap<String, Note>,
}

/// Inline state: the innermost character style and the formatting in effect.
#[derive(Clone, Default)]
struct Inline {
    style: Option<String>,
    format: ManualFormat,
}

impl Inline {
    fn nested(&self, style: &str, format: ManualFormat) -> Self {
        Self {
            style: Some(style.to_string()),
            format: self.format | format,
        }
    }
}

impl Builder {
    fn collect_footnotes<'a>(&mut self, root: &'a AstNode<'a>) {
        for child in root.children() {
            let name = match &child.data.borrow().value {
                NodeValue::FootnoteDefinition(def) => def.name.clone(),
                _ => continue,
            };
            let mut nodes = Vec::new();
            for block in child.children() {
                self.block(block, None, &mut nodes);
            }
            let paragraphs = nodes
                .into_iter()
                .filter_map(|node| match node {
                    Node::Paragraph(para) => Some(para),
                    Node::Table(_) => {
                        log::warn!("Table in footnote [^{}] ignored", name);
                        None
                    }
                })
                .collect();
            self.footnotes.insert(name, Note::new(paragraphs));
        }
    }

    fn block<'a>(&self, node: &'a AstNode<'a>, style: Option<&str>, out: &mut Vec<Node>) {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Paragraph => {
                let para = Paragraph::styled(style.unwrap_or(NORMAL_STYLE));
                out.push(self.inlines(node, para).into());
            }
            NodeValue::Heading(heading) => {
                let para = Paragraph::styled(heading_style(heading.level));
                out.push(self.inlines(node, para).into());
            }
            NodeValue::List(_) => {
                for item in node.children() {
                    for child in item.children() {
                        self.block(child, Some(LIST_ITEM_STYLE), out);
                    }
                }
            }
            NodeValue::BlockQuote | NodeValue::MultilineBlockQuote(_) => {
                for child in node.children() {
                    self.block(child, Some(BLOCK_QUOTE_STYLE), out);
                }
            }
            NodeValue::CodeBlock(code) => {
                for line in code.literal.lines() {
                    out.push(Paragraph::styled(CODE_BLOCK_STYLE).with_text(line).into());
                }
            }
            NodeValue::ThematicBreak => {
                out.push(Paragraph::styled(NORMAL_STYLE).with_page_break().into());
            }
            NodeValue::Table(_) => out.push(self.table(node).into()),
            NodeValue::HtmlBlock(_) => log::warn!("HTML is ignored in Markdown"),
            NodeValue::FootnoteDefinition(_) => {}
            other => log::debug!("Ignoring Markdown block {:?}", other),
        }
    }

    fn table<'a>(&self, node: &'a AstNode<'a>) -> Table {
        let mut table = Table::new(Some(TABLE_STYLE));
        for row in node.children() {
            let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            if header {
                table.header_rows += 1;
            }
            let cells = row
                .children()
                .map(|cell| Cell::new(self.inlines(cell, Paragraph::styled(TABLE_CELL_STYLE))))
                .collect();
            table = table.with_row(Row::new(cells));
        }
        table
    }

    fn inlines<'a>(&self, node: &'a AstNode<'a>, para: Paragraph) -> Paragraph {
        let mut chunks = Vec::new();
        for child in node.children() {
            self.inline(child, &Inline::default(), &mut chunks);
        }
        Paragraph { chunks, ..para }
    }

    fn inline<'a>(&self, node: &'a AstNode<'a>, state: &Inline, chunks: &mut Vec<Chunk>) {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Text(text) => push_text(chunks, state, &text),
            NodeValue::SoftBreak | NodeValue::LineBreak => push_text(chunks, state, " "),
            NodeValue::Code(code) => {
                let code_state = state.nested(CODE_STYLE, ManualFormat::NORMAL);
                push_text(chunks, &code_state, &code.literal)
            }
            NodeValue::Emph => {
                self.children(node, &state.nested(EMPHASIS_STYLE, ManualFormat::ITALIC), chunks)
            }
            NodeValue::Strong => {
                self.children(node, &state.nested(STRONG_STYLE, ManualFormat::BOLD), chunks)
            }
            NodeValue::Link(_) => {
                self.children(node, &state.nested(LINK_STYLE, ManualFormat::NORMAL), chunks)
            }
            NodeValue::Superscript => {
                let raised = Inline {
                    style: state.style.clone(),
                    format: state.format | ManualFormat::SUPERSCRIPT,
                };
                self.children(node, &raised, chunks)
            }
            NodeValue::Image(link) => match self.image(&link.url) {
                Ok(image) => chunks.push(Chunk::Image(image)),
                Err(err) => log::warn!("Skipping image {:?}: {}", link.url, err),
            },
            NodeValue::FootnoteReference(reference) => match self.footnotes.get(&reference.name) {
                Some(note) => attach_footnote(chunks, state, note.clone()),
                None => log::warn!("Footnote [^{}] is never defined", reference.name),
            },
            NodeValue::HtmlInline(_) => log::debug!("Ignoring inline HTML"),
            _ => self.children(node, state, chunks),
        }
    }

    fn children<'a>(&self, node: &'a AstNode<'a>, state: &Inline, chunks: &mut Vec<Chunk>) {
        for child in node.children() {
            self.inline(child, state, chunks);
        }
    }

    fn image(&self, url: &str) -> Result<Image, SourceError> {
        let path = self.base_dir.join(url);
        let data = fs::read(&path).map_err(|e| SourceError::io(&path, e))?;
        let suffix = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        Ok(Image {
            suffix,
            data: Arc::new(data),
        })
    }
}

/// Appends text, extending the last span when its style and formatting match.
fn push_text(chunks: &mut Vec<Chunk>, state: &Inline, text: &str) {
    if let Some(Chunk::Span(span)) = chunks.last_mut() {
        if span.style == state.style && span.format == state.format && span.footnotes.is_empty() {
            match span.text.last_mut() {
                Some(last) => last.push_str(text),
                None => span.text.push(text.to_string()),
            }
            return;
        }
    }
    let mut span = Span::new(text).with_format(state.format);
    span.style = state.style.clone();
    chunks.push(Chunk::Span(span));
}

/// Footnotes hang off the span they follow.
fn attach_footnote(chunks: &mut Vec<Chunk>, state: &Inline, note: Note) {
    if let Some(Chunk::Span(span)) = chunks.last_mut() {
        span.footnotes.push(note);
        return;
    }
    let mut span = Span::new("").with_format(state.format).with_footnote(note);
    span.style = state.style.clone();
    chunks.push(Chunk::Span(span));
}
