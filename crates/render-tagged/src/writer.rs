use crate::text::escape;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tagpress_style::{StyleId, StyleRegistry};
use tagpress_types::{DocumentProperties, Realm};

static GROUP_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*/\s*").expect("BUG: group separator regex is invalid"));

const COLOR_TABLE: &str = "<ColorTable:=\
<Black:COLOR:CMYK:Process:0,0,0,1>\
<Cyan:COLOR:CMYK:Process:1,0,0,0>\
<Magenta:COLOR:CMYK:Process:0,1,0,0>\
<Yellow:COLOR:CMYK:Process:0,0,1,0>>";

/// The name a style is referenced by in tags; `/` becomes the group separator.
pub fn idname(name: &str) -> String {
    GROUP_SEPARATOR_RE.replace_all(name, r"\:").into_owned()
}

fn mnemonic(realm: Realm) -> &'static str {
    match realm {
        Realm::Character => "Char",
        Realm::Paragraph => "Para",
        Realm::Table => "Table",
    }
}

/// How far a style's definition got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Progress {
    Seen,
    Defined,
    Written,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    pub rows: usize,
    pub cols: usize,
    pub header_rows: usize,
}

#[derive(Debug)]
enum Container {
    Table,
    Cell { filler_cells: usize },
    Footnote { outer_char_style: Option<StyleId> },
}

/// Builds InDesign Tagged Text in memory.
///
/// The header (banner, color table, style definitions known so far) is
/// written when the first paragraph opens. A style first met after that is
/// defined inline, right before its first use. Either way a style's parent
/// and next style are defined before the style itself. A next-style chain
/// that loops back loses its closing edge.
#[derive(Debug)]
pub struct TaggedTextWriter {
    properties: DocumentProperties,
    buffer: String,
    header_written: bool,
    progress: HashMap<StyleId, Progress>,
    known: Vec<StyleId>,
    cut_next: HashSet<StyleId>,
    shades: HashMap<Realm, i32>,
    char_style: Option<StyleId>,
    containers: Vec<Container>,
}

impl TaggedTextWriter {
    pub fn new(properties: DocumentProperties) -> Self {
        Self {
            properties,
            buffer: String::new(),
            header_written: false,
            progress: HashMap::new(),
            known: Vec::new(),
            cut_next: HashSet::new(),
            shades: HashMap::new(),
            char_style: None,
            containers: Vec::new(),
        }
    }

    pub fn is_header_written(&self) -> bool {
        self.header_written
    }

    pub fn progress(&self, id: StyleId) -> Option<Progress> {
        self.progress.get(&id).copied()
    }

    /// The character style currently in effect.
    pub fn character_style(&self) -> Option<StyleId> {
        self.char_style
    }

    /// The text written so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Makes a style known to the output, with the used styles it depends on.
    pub fn define_style(&mut self, styles: &StyleRegistry, id: StyleId) {
        if self.progress.contains_key(&id) {
            return;
        }
        self.progress.insert(id, Progress::Seen);

        let style = &styles[id];
        for dependency in [style.parent, style.next].into_iter().flatten() {
            if styles[dependency].used {
                self.define_style(styles, dependency);
            }
        }
        if let Some(next) = style.next.filter(|next| *next != id) {
            if self.progress(next) == Some(Progress::Seen) {
                log::debug!("[{}] next style loops back; dropping {:?}", style.section_name(), styles[next].name);
                self.cut_next.insert(id);
            }
        }

        self.progress.insert(id, Progress::Defined);
        self.known.push(id);
        if self.header_written {
            self.write_definition(styles, id);
        }
    }

    pub fn define_text_variable(&mut self, name: &str, value: &str) {
        self.buffer.push_str("<DefineTextVariable:");
        self.buffer.push_str(&escape(name));
        self.buffer.push_str("=<TextVarType:CustomText><tvString:");
        self.buffer.push_str(&escape(value));
        self.buffer.push_str(">>");
    }

    fn write_header(&mut self, styles: &StyleRegistry) {
        if self.header_written {
            return;
        }
        self.buffer.push_str("<UNICODE-MAC>\n<Version:13.1>");
        if self.properties.has_rtl {
            self.buffer.push_str("<FeatureSet:Indesign-R2L>");
        }
        self.buffer.push_str(COLOR_TABLE);
        self.buffer.push('\n');
        for id in self.known.clone() {
            self.write_definition(styles, id);
            self.buffer.push('\n');
        }
        self.header_written = true;
    }

    fn write_definition(&mut self, styles: &StyleRegistry, id: StyleId) {
        if self.progress(id) >= Some(Progress::Written) {
            return;
        }
        let style = &styles[id];
        log::debug!("InDesign: {}", style);

        self.buffer.push_str("<Define");
        self.buffer.push_str(mnemonic(style.realm));
        self.buffer.push_str("Style:");
        self.buffer.push_str(&idname(&style.name));
        if style.markup.is_empty() {
            let shade = self.shades.entry(style.realm).or_insert(0);
            let fullness = 50.0 + 50.0 / 1.05_f64.powi(*shade);
            *shade += 1;
            match style.realm {
                Realm::Paragraph => self.buffer.push_str(&format!(
                    "<pShadingColor:Yellow><pShadingOn:1><pShadingTint:{}>",
                    (100.0 - fullness) as i32
                )),
                Realm::Character => self.buffer.push_str(&format!(
                    "<cColor:Magenta><cColorTint:{}>",
                    fullness as i32
                )),
                Realm::Table => {}
            }
        } else {
            self.buffer.push_str(&style.markup);
        }

        if let Some(parent) = style.parent.filter(|p| styles[*p].used) {
            self.buffer.push_str("<BasedOn:");
            self.buffer.push_str(&idname(&styles[parent].name));
            self.buffer.push('>');
        }
        if let Some(next) = style.next.filter(|n| styles[*n].used && !self.cut_next.contains(&id)) {
            self.buffer.push_str("<Nextstyle:");
            self.buffer.push_str(&idname(&styles[next].name));
            self.buffer.push('>');
        }
        self.buffer.push('>');

        self.progress.insert(id, Progress::Written);
    }

    fn write_style_tag(&mut self, styles: &StyleRegistry, realm: Realm, style: Option<StyleId>) {
        if let Some(id) = style {
            self.define_style(styles, id);
        }
        self.buffer.push('<');
        self.buffer.push_str(mnemonic(realm));
        self.buffer.push_str("Style:");
        if let Some(id) = style {
            self.buffer.push_str(&idname(&styles[id].name));
        }
        self.buffer.push('>');
    }

    pub fn enter_paragraph(&mut self, styles: &StyleRegistry, style: Option<StyleId>) {
        self.write_header(styles);
        self.write_style_tag(styles, Realm::Paragraph, style);
        if self.char_style.is_some() {
            self.write_style_tag(styles, Realm::Character, self.char_style);
        }
    }

    pub fn leave_paragraph(&mut self) {
        if self.char_style.is_some() {
            self.buffer.push_str("<CharStyle:>");
        }
        if !matches!(self.containers.last(), Some(Container::Cell { .. })) {
            self.buffer.push('\n');
        }
    }

    pub fn enter_table(
        &mut self,
        styles: &StyleRegistry,
        shape: TableShape,
        style: Option<StyleId>,
        rtl: bool,
    ) {
        self.write_style_tag(styles, Realm::Table, style);
        let direction = if rtl { "RTL" } else { "LTR" };
        self.buffer.push_str(&format!(
            "<TableStart:{},{}:{}:0:{}>",
            shape.rows, shape.cols, shape.header_rows, direction
        ));
        self.containers.push(Container::Table);
    }

    pub fn leave_table(&mut self) {
        self.buffer.push_str("<TableEnd:>");
        self.pop_container("table");
    }

    pub fn enter_table_row(&mut self) {
        self.buffer.push_str("<RowStart:>");
    }

    pub fn leave_table_row(&mut self) {
        self.buffer.push_str("<RowEnd:>");
    }

    /// Opens a cell spanning `rows` x `cols`. Spanned columns are closed with
    /// empty filler cells when the cell is left.
    pub fn enter_table_cell(&mut self, rows: usize, cols: usize) {
        self.buffer.push_str(&format!("<CellStart:{},{}>", rows, cols));
        self.containers.push(Container::Cell {
            filler_cells: cols.saturating_sub(1),
        });
    }

    pub fn leave_table_cell(&mut self) {
        self.buffer.push_str("<CellEnd:>");
        if let Some(Container::Cell { filler_cells }) = self.pop_container("cell") {
            for _ in 0..filler_cells {
                self.buffer.push_str("<CellStart:><CellEnd:>");
            }
        }
    }

    /// Switches the character style, emitting a tag only on change.
    /// Returns the style that was in effect.
    pub fn set_character_style(&mut self, styles: &StyleRegistry, style: Option<StyleId>) -> Option<StyleId> {
        let previous = self.char_style;
        if style != previous {
            self.write_style_tag(styles, Realm::Character, style);
            self.char_style = style;
        }
        previous
    }

    /// Opens a footnote at the current position. The footnote starts with no
    /// character style; the outer one is back in effect after
    /// [`leave_footnote`](Self::leave_footnote).
    pub fn enter_footnote(&mut self) {
        self.buffer.push_str("<FootnoteStart:>");
        self.containers.push(Container::Footnote {
            outer_char_style: self.char_style,
        });
        self.char_style = None;
    }

    pub fn leave_footnote(&mut self) {
        if self.buffer.ends_with('\n') {
            self.buffer.pop();
        }
        self.buffer.push_str("<FootnoteEnd:>");
        if let Some(Container::Footnote { outer_char_style }) = self.pop_container("footnote") {
            self.char_style = outer_char_style;
        }
    }

    pub fn write_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.buffer.push_str(&escape(text));
        }
    }

    fn pop_container(&mut self, expected: &str) -> Option<Container> {
        let container = self.containers.pop();
        if container.is_none() {
            log::error!("Leaving a {} that was never entered", expected);
        }
        container
    }

    /// Finishes the output, writing the header if no paragraph ever did.
    pub fn into_text(mut self, styles: &StyleRegistry) -> String {
        if !self.containers.is_empty() {
            log::warn!("{} container(s) left open at end of output", self.containers.len());
        }
        self.write_header(styles);
        self.buffer
    }
}
