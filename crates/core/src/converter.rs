//! The traversal driver.
//!
//! Walks a document's nodes once, resolving every paragraph, span and table
//! to a style (registry lookup, then manual-format synthesis, then rules) and
//! feeding the tagged-text writer.

use crate::error::ConvertError;
use crate::options::ConvertOptions;
use crate::state::{Halt, ScopeStack};
use itertools::Itertools;
use std::collections::HashSet;
use std::sync::Arc;
use tagpress_idf::{Chunk, Formula, Image, Node, Note, Paragraph, Row, Span, Table};
use tagpress_render_tagged::{TableShape, TaggedTextWriter};
use tagpress_settings::{GENERAL_SECTION, SettingsStore};
use tagpress_style::{ManualStyles, RuleContext, RuleSet, SpecialStyles, StyleId, StyleRegistry};
use tagpress_traits::{Artifact, ArtifactStore, DocumentSource};
use tagpress_types::{ManualFormat, Realm};

const STOP_MARKER_KEY: &str = "stop_marker";

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Used styles per realm.
    pub used_styles: Vec<(Realm, usize)>,
    /// `(rule, applications)` for every rule that applied at least once.
    pub rule_applications: Vec<(String, usize)>,
    pub synthesized_styles: usize,
    pub stop_marker_found: bool,
}

impl ConvertStats {
    pub fn log(&self) {
        for (realm, count) in &self.used_styles {
            log::info!("Number of {} styles used: {}", realm.title(), count);
        }
        for (rule, applied) in &self.rule_applications {
            log::info!("{} application(s) of {}", applied, rule);
        }
        if self.synthesized_styles > 0 {
            log::debug!("{} style(s) synthesized from manual formatting", self.synthesized_styles);
        }
    }
}

/// What a finished conversion hands back.
#[derive(Debug)]
pub struct ConvertOutput {
    /// The tagged text, with text transforms applied.
    pub text: String,
    /// The settings, updated with every style the run activated.
    pub settings: SettingsStore,
    pub stats: ConvertStats,
}

/// Converts one document to tagged text.
#[derive(Debug)]
pub struct Converter {
    options: ConvertOptions,
    settings: SettingsStore,
    registry: StyleRegistry,
    manual: ManualStyles,
    rules: RuleSet,
    special: SpecialStyles,
    writer: TaggedTextWriter,
    artifacts: Arc<dyn ArtifactStore>,
    scopes: ScopeStack,
    stop_marker: Option<String>,
    stop_marker_found: bool,
}

impl Converter {
    /// Prepares the style graph for `source`: base and special styles, the
    /// document's declarations and usage, links, then rules.
    pub fn new(
        source: &dyn DocumentSource,
        mut settings: SettingsStore,
        options: ConvertOptions,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Result<Self, ConvertError> {
        let stop_marker = resolve_stop_marker(&mut settings, options.stop_marker.as_deref());
        let mut rules = RuleSet::from_settings(&settings);

        let mut registry = StyleRegistry::new(options.base_styles.clone(), &settings)?
            .with_variable_bindings(options.style_to_variable.clone());
        let special = SpecialStyles::declare(&mut registry, &settings);
        registry.declare_document_styles(source.style_definitions(), &settings);
        for mention in source.style_mentions() {
            if registry.mark_used(mention.realm, &mention.local_id) {
                log::debug!("Style used: {}:{:?}", mention.realm, mention.local_id);
            }
        }
        registry.link(&settings);
        rules.link(&mut registry, &settings);
        log::debug!(
            "{} style(s) and {} rule(s) ready for {}",
            registry.len(),
            rules.len(),
            source.name()
        );

        Ok(Self {
            writer: TaggedTextWriter::new(source.properties()),
            options,
            settings,
            registry,
            manual: ManualStyles::new(),
            rules,
            special,
            artifacts,
            scopes: ScopeStack::default(),
            stop_marker,
            stop_marker_found: false,
        })
    }

    /// Converts `source` in one go.
    pub fn run(
        source: &dyn DocumentSource,
        settings: SettingsStore,
        options: ConvertOptions,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Result<ConvertOutput, ConvertError> {
        let mut converter = Self::new(source, settings, options, artifacts)?;
        converter.convert_document(source.nodes());
        Ok(converter.finish())
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn stop_marker(&self) -> Option<&str> {
        self.stop_marker.as_deref()
    }

    /// Converts a document body, one node at a time.
    pub fn convert_document(&mut self, nodes: &[Node]) {
        let state = self.scopes.state();
        state.post_empty = false;
        state.post_break = false;
        match self.convert_nodes(nodes) {
            Ok(()) => {
                if let Some(marker) = &self.stop_marker {
                    log::info!("Note: Stop marker was never found");
                    log::debug!("In other words, no {:?}", marker);
                }
            }
            Err(Halt) => self.stop_marker_found = true,
        }
    }

    fn convert_nodes(&mut self, nodes: &[Node]) -> Result<(), Halt> {
        for node in nodes {
            match node {
                Node::Paragraph(para) => self.convert_paragraph(para)?,
                Node::Table(table) => self.convert_table(table)?,
            }
        }
        Ok(())
    }

    /// Finishes the output and reports statistics.
    pub fn finish(self) -> ConvertOutput {
        let stats = self.stats();
        stats.log();
        let text = self.writer.into_text(&self.registry);
        let text = self.options.transforms.apply(&text).into_owned();
        ConvertOutput {
            text,
            settings: self.settings,
            stats,
        }
    }

    fn stats(&self) -> ConvertStats {
        ConvertStats {
            used_styles: Realm::ALL
                .iter()
                .map(|&realm| (realm, self.registry.used_count(realm)))
                .collect(),
            rule_applications: self
                .rules
                .iter()
                .filter(|rule| rule.applied > 0)
                .map(|rule| (rule.to_string(), rule.applied))
                .collect(),
            synthesized_styles: self.manual.len(),
            stop_marker_found: self.stop_marker_found,
        }
    }

    fn convert_table(&mut self, table: &Table) -> Result<(), Halt> {
        let container = Some(self.special.table_container);
        self.activate(container);
        self.writer.enter_paragraph(&self.registry, container);

        let (rows, cols) = table.shape();
        let rtl = table.format.contains(ManualFormat::RTL);
        let style = self.lookup(Realm::Table, table.style.as_deref());
        let shape = TableShape {
            rows,
            cols,
            header_rows: table.header_rows,
        };
        self.writer.enter_table(&self.registry, shape, style, rtl);
        let result = self.convert_rows(&table.rows);
        self.writer.leave_table();

        self.writer.leave_paragraph();
        result
    }

    fn convert_rows(&mut self, rows: &[Row]) -> Result<(), Halt> {
        for row in rows {
            self.writer.enter_table_row();
            let result = self.convert_cells(row);
            self.writer.leave_table_row();
            result?;
        }
        Ok(())
    }

    fn convert_cells(&mut self, row: &Row) -> Result<(), Halt> {
        for cell in &row.cells {
            self.writer.enter_table_cell(cell.rows, cell.cols);
            let result = self.convert_paragraph(&cell.contents);
            self.writer.leave_table_cell();
            result?;
        }
        Ok(())
    }

    fn convert_paragraph(&mut self, para: &Paragraph) -> Result<(), Halt> {
        self.scopes.state().is_empty = true;
        self.check_for_stop_paragraph(para)?;

        let unadorned = self.paragraph_style(para);
        let style = self.apply_rules(unadorned, para);

        self.writer.enter_paragraph(&self.registry, style);
        let result = self.convert_chunks(&para.chunks);
        if result.is_ok() {
            let variable = style.and_then(|id| self.registry[id].variable.clone());
            if let Some(variable) = variable {
                self.writer.define_text_variable(&variable, &para.text());
            }
        }
        self.writer.leave_paragraph();
        result?;

        // For the next paragraph
        let state = self.scopes.state();
        if para.page_break {
            state.post_break = true;
            state.is_empty = false;
        } else if state.post_break {
            if state.is_empty {
                log::debug!("Empty paragraph, next is still post-break");
            } else {
                state.post_break = false;
            }
        }
        state.post_empty = state.is_empty;
        state.previous = style;
        Ok(())
    }

    fn convert_chunks(&mut self, chunks: &[Chunk]) -> Result<(), Halt> {
        for chunk in chunks {
            match chunk {
                Chunk::Span(span) => self.convert_span(span)?,
                Chunk::Image(image) => self.convert_image(image),
                Chunk::Formula(formula) => self.convert_formula(formula),
            }
        }
        Ok(())
    }

    /// The paragraph's own style, or one synthesized from its formatting.
    fn paragraph_style(&mut self, para: &Paragraph) -> Option<StyleId> {
        self.scopes.state().para_char_format = ManualFormat::NORMAL;

        let unadorned = self.lookup(Realm::Paragraph, para.style.as_deref());
        if !self.options.manual {
            return unadorned;
        }

        let mask = self.options.direction.mask();
        let mut format = para.format & mask;
        let state = self.scopes.state();
        if state.post_break {
            format |= ManualFormat::NEW_PAGE;
        } else if state.post_empty {
            format |= ManualFormat::SPACED;
        }

        let first_text = para.spans().next().and_then(|span| span.text.first());
        if first_text.is_some_and(|text| text.starts_with(char::is_whitespace)) {
            format |= ManualFormat::INDENTED;
        }

        let span_formats: HashSet<ManualFormat> = para.spans().map(|span| span.format & mask).collect();
        if let Ok(shared) = span_formats.into_iter().exactly_one() {
            state.para_char_format = shared;
            format |= shared;
        }

        self.synthesize(Realm::Paragraph, unadorned, format)
    }

    fn character_style(&mut self, span: &Span) -> Option<StyleId> {
        let unadorned = self.lookup(Realm::Character, span.style.as_deref());
        if !self.options.manual_spans() {
            return unadorned;
        }

        let mut format = span.format & self.options.direction.mask();
        if format == self.scopes.state().para_char_format {
            // Already part of the paragraph style
            format = ManualFormat::NORMAL;
        }
        self.synthesize(Realm::Character, unadorned, format)
    }

    fn synthesize(&mut self, realm: Realm, base: Option<StyleId>, format: ManualFormat) -> Option<StyleId> {
        let style = self
            .manual
            .synthesize(&mut self.registry, &self.settings, realm, base, format);
        self.activate(style);
        style
    }

    fn apply_rules(&mut self, style: Option<StyleId>, para: &Paragraph) -> Option<StyleId> {
        let style = style?;
        let ctx = RuleContext {
            previous: self.scopes.state().previous,
            paragraph_blank: para.is_blank(),
        };
        let result = self.rules.apply(&self.registry, style, &ctx);
        if result != style {
            self.activate(Some(result));
        }
        Some(result)
    }

    fn lookup(&mut self, realm: Realm, local_id: Option<&str>) -> Option<StyleId> {
        self.registry
            .lookup_or_activate(realm, local_id, &mut self.settings)
    }

    fn activate(&mut self, style: Option<StyleId>) {
        if let Some(id) = style {
            self.registry.activate(id, &mut self.settings);
        }
    }

    fn convert_span(&mut self, span: &Span) -> Result<(), Halt> {
        let style = self.character_style(span);
        self.switch_character_style(style);
        self.convert_span_text(span)?;

        for footnote in &span.footnotes {
            self.convert_note(footnote, self.special.footnote_reference)?;
            self.scopes.state().is_empty = false;
        }
        if self.options.convert_comments {
            for comment in &span.comments {
                self.convert_note(comment, self.special.comment_reference)?;
            }
        }
        Ok(())
    }

    fn convert_span_text(&mut self, span: &Span) -> Result<(), Halt> {
        for text in &span.text {
            let text = if self.scopes.state().is_empty && self.options.manual {
                text.trim_start()
            } else {
                text.as_str()
            };
            self.write_text(text)?;
            if !text.trim().is_empty() {
                self.scopes.state().is_empty = false;
            }
        }
        Ok(())
    }

    /// Sets the current character style; returns the previous one.
    fn switch_character_style(&mut self, style: Option<StyleId>) -> Option<StyleId> {
        let previous = self.scopes.state().char_style;
        if style != previous {
            self.writer.set_character_style(&self.registry, style);
            self.scopes.state().char_style = style;
        }
        previous
    }

    /// Writes text up to the stop marker, if it shows up.
    fn write_text(&mut self, text: &str) -> Result<(), Halt> {
        let found = self
            .stop_marker
            .as_deref()
            .and_then(|marker| text.find(marker));
        match found {
            Some(offset) => {
                self.emit_text(&text[..offset]);
                log::info!("Stop marker found");
                Err(Halt)
            }
            None => {
                self.emit_text(text);
                Ok(())
            }
        }
    }

    fn emit_text(&mut self, text: &str) {
        let text = self.scopes.current().filter(text);
        self.writer.write_text(text);
    }

    fn check_for_stop_paragraph(&self, para: &Paragraph) -> Result<(), Halt> {
        match &self.stop_marker {
            Some(marker) if para.text().starts_with(marker.as_str()) => {
                log::info!("Stop marker found at the beginning of a paragraph");
                Err(Halt)
            }
            _ => Ok(()),
        }
    }

    /// Converts a footnote or comment in a scope of its own.
    ///
    /// The reference mark takes `ref_style`. The enclosing scope and its
    /// character style are restored however the note's conversion ends.
    fn convert_note(&mut self, note: &Note, ref_style: StyleId) -> Result<(), Halt> {
        let outer_char_style = self.scopes.state().char_style;
        self.activate(Some(ref_style));
        self.writer.set_character_style(&self.registry, Some(ref_style));
        self.writer.enter_footnote();
        self.scopes.push_note();

        let result = note
            .paragraphs
            .iter()
            .try_for_each(|para| self.convert_paragraph(para));

        self.scopes.pop();
        self.writer.leave_footnote();
        self.writer.set_character_style(&self.registry, outer_char_style);
        result
    }

    fn convert_image(&mut self, image: &Image) {
        let artifact = Artifact::image(image);
        match self.artifacts.convert_and_cache(&artifact, &image.suffix) {
            Ok(path) => self.write_artifact_link(&path, self.special.image),
            Err(err) => log::warn!("Skipping image: {}", err),
        }
    }

    fn convert_formula(&mut self, formula: &Formula) {
        let artifact = Artifact::formula(formula);
        let suffix = artifact.suffix.clone();
        match self.artifacts.convert_and_cache(&artifact, &suffix) {
            Ok(path) => self.write_artifact_link(&path, self.special.formula),
            Err(err) => log::warn!("Skipping formula: {}", err),
        }
    }

    /// Writes an artifact's path as a placeholder in `style`.
    fn write_artifact_link(&mut self, path: &str, style: StyleId) {
        self.activate(Some(style));
        let previous = self.switch_character_style(Some(style));
        self.emit_text(path);
        self.switch_character_style(previous);
    }
}

/// The stop marker for this run: a given one is remembered in the settings,
/// otherwise the remembered one is used.
fn resolve_stop_marker(settings: &mut SettingsStore, given: Option<&str>) -> Option<String> {
    settings.ensure_section(GENERAL_SECTION);
    match given.filter(|m| !m.is_empty()) {
        Some(marker) => {
            settings.set(GENERAL_SECTION, STOP_MARKER_KEY, marker);
            Some(marker.to_string())
        }
        None => settings
            .get(GENERAL_SECTION, STOP_MARKER_KEY)
            .filter(|m| !m.is_empty())
            .map(str::to_string),
    }
}
