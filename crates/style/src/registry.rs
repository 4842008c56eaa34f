//! The style registry: an arena owning every style of one run.
//!
//! Styles are created by declaration (from the document, from special
//! styles, from synthesis and rules) and referenced everywhere else through
//! [`StyleId`] handles, so graph rewrites are plain single-owner mutations.

use crate::error::StyleError;
use crate::special::{COMMENT_TEXT_STYLE, SPECIAL_GROUP};
use crate::style::{Style, StyleId};
use std::collections::{HashMap, HashSet};
use std::ops::Index;
use tagpress_settings::SettingsStore;
use tagpress_types::{Realm, StyleDecl};

/// InDesign's name for the default table style.
pub const BASIC_TABLE_STYLE: &str = r"\[Basic Table\]";

/// The configured base style name of each realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseStyles {
    pub character: String,
    pub paragraph: String,
    pub table: String,
}

impl Default for BaseStyles {
    fn default() -> Self {
        Self {
            character: "NormalCharacterStyle".to_string(),
            paragraph: "NormalParagraphStyle".to_string(),
            table: BASIC_TABLE_STYLE.to_string(),
        }
    }
}

impl BaseStyles {
    pub fn get(&self, realm: Realm) -> &str {
        match realm {
            Realm::Character => &self.character,
            Realm::Paragraph => &self.paragraph,
            Realm::Table => &self.table,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bases {
    character: StyleId,
    paragraph: StyleId,
    table: StyleId,
}

impl Bases {
    fn get(&self, realm: Realm) -> StyleId {
        match realm {
            Realm::Character => self.character,
            Realm::Paragraph => self.paragraph,
            Realm::Table => self.table,
        }
    }
}

/// Hard-coded attributes that win over what a document declares.
struct BuiltinOverride {
    name: Option<&'static str>,
    markup: Option<&'static str>,
}

fn builtin_override(realm: Realm, internal_name: &str) -> Option<BuiltinOverride> {
    match (realm, internal_name) {
        (Realm::Paragraph, "annotation text") => Some(BuiltinOverride {
            name: Some(COMMENT_TEXT_STYLE),
            markup: Some("<cSize:6><cColor:Cyan><cColorTint:100>"),
        }),
        _ => None,
    }
}

/// Built-in styles that never reach the output.
fn is_ignored(realm: Realm, internal_name: &str) -> bool {
    matches!((realm, internal_name), (Realm::Character, "annotation reference"))
}

/// Section-safe internal name for a base style (`\[Basic Table\]` -> `Basic Table`).
fn base_internal_name(name: &str) -> String {
    name.replace(['\\', '[', ']'], "")
}

#[derive(Debug)]
pub struct StyleRegistry {
    styles: Vec<Style>,
    index: HashMap<(Realm, String), StyleId>,
    base_names: BaseStyles,
    bases: Bases,
    variables: HashMap<String, String>,
}

impl StyleRegistry {
    /// Creates a registry holding the base style of every realm.
    ///
    /// A realm with an empty base name is the one unrecoverable configuration.
    pub fn new(base_names: BaseStyles, settings: &SettingsStore) -> Result<Self, StyleError> {
        for realm in Realm::ALL {
            if base_names.get(realm).trim().is_empty() {
                return Err(StyleError::MissingBase(realm));
            }
        }

        let placeholder = StyleId(0);
        let mut registry = Self {
            styles: Vec::new(),
            index: HashMap::new(),
            base_names,
            bases: Bases {
                character: placeholder,
                paragraph: placeholder,
                table: placeholder,
            },
            variables: HashMap::new(),
        };

        let character = registry.declare_base(Realm::Character, settings);
        let paragraph = registry.declare_base(Realm::Paragraph, settings);
        let table = registry.declare_base(Realm::Table, settings);
        registry.bases = Bases {
            character,
            paragraph,
            table,
        };
        Ok(registry)
    }

    fn declare_base(&mut self, realm: Realm, settings: &SettingsStore) -> StyleId {
        let name = self.base_names.get(realm).to_string();
        let decl = StyleDecl::in_realm(realm, name.clone())
            .with_internal_name(base_internal_name(&name))
            .with_name(name)
            .automatic()
            .used();
        self.declare(decl, settings)
    }

    /// Binds paragraph styles (by internal name) to text variables.
    ///
    /// Applies to styles declared from now on, and to existing styles with no
    /// binding of their own.
    pub fn with_variable_bindings(mut self, bindings: HashMap<String, String>) -> Self {
        for style in self.styles.iter_mut().filter(|s| s.realm == Realm::Paragraph) {
            if style.variable.is_none() {
                style.variable = bindings.get(&style.internal_name).cloned();
            }
        }
        self.variables = bindings;
        self
    }

    /// Declares a style; idempotent per `(realm, local_id)`.
    ///
    /// Attribute layers, later winning: the caller's declaration, hard-coded
    /// overrides, then the writable fields persisted in `settings`. An unknown
    /// realm is logged and treated as the character realm.
    pub fn declare(&mut self, decl: StyleDecl, settings: &SettingsStore) -> StyleId {
        let realm = match decl.realm.parse::<Realm>() {
            Ok(realm) => realm,
            Err(err) => {
                log::error!("{} (style {:?}); treating it as a character style", err, decl.local_id);
                Realm::Character
            }
        };
        if let Some(id) = self.find(realm, &decl.local_id) {
            log::debug!("{} {:?} already declared", realm, decl.local_id);
            return id;
        }

        let internal_name = decl.effective_internal_name().to_string();
        let mut style = Style {
            realm,
            local_id: decl.local_id,
            internal_name,
            name: decl.name.unwrap_or_default(),
            parent_id: decl.parent_id.filter(|p| !p.is_empty()),
            next_id: decl.next_id.filter(|n| !n.is_empty()),
            automatic: decl.automatic,
            custom: decl.custom,
            format: decl.format,
            markup: decl.markup.unwrap_or_default(),
            variable: decl.variable,
            used: decl.used,
            count: 0,
            parent: None,
            next: None,
            activated: false,
        };

        let base_name = self.base_names.get(realm);
        if style.parent_id.is_none() && style.local_id != base_name {
            style.parent_id = Some(base_name.to_string());
        }
        if let Some(builtin) = builtin_override(realm, &style.internal_name) {
            if let Some(name) = builtin.name {
                style.name = name.to_string();
            }
            if let Some(markup) = builtin.markup {
                style.markup = markup.to_string();
            }
        }
        if style.name.is_empty() {
            style.name = style.internal_name.clone();
        }
        settings.read_fields(&style.section_name(), &mut style, true);
        if realm == Realm::Paragraph && style.variable.is_none() {
            style.variable = self.variables.get(&style.internal_name).cloned();
        }

        let id = StyleId(self.styles.len());
        log::debug!("Created {}", style);
        self.index.insert((realm, style.local_id.clone()), id);
        self.styles.push(style);
        id
    }

    /// Declares a style after the graph was linked, linking it right away.
    pub fn declare_linked(&mut self, decl: StyleDecl, settings: &SettingsStore) -> StyleId {
        let id = self.declare(decl, settings);
        self.link_style(id, settings);
        id
    }

    /// Declares everything a document defines.
    ///
    /// Styles the document flags as automatic get a neutral
    /// `(group)/automatic-N` display name, counted per realm.
    pub fn declare_document_styles(
        &mut self,
        decls: impl IntoIterator<Item = StyleDecl>,
        settings: &SettingsStore,
    ) {
        let mut automatic_counts: HashMap<String, usize> = HashMap::new();
        for mut decl in decls {
            if decl.automatic {
                let count = automatic_counts.entry(decl.realm.to_ascii_lowercase()).or_insert(0);
                *count += 1;
                decl.name = Some(format!("{}/automatic-{}", SPECIAL_GROUP, count));
            }
            self.declare(decl, settings);
        }
    }

    /// Marks a style as used. Unknown styles are logged and ignored.
    pub fn mark_used(&mut self, realm: Realm, local_id: &str) -> bool {
        match self.find(realm, local_id) {
            Some(id) => {
                self.styles[id.0].used = true;
                true
            }
            None => {
                log::debug!("{} style {:?} is used but not declared", realm, local_id);
                false
            }
        }
    }

    /// Resolves every style's parent/next ids into handles.
    ///
    /// Ids that name no declared style get an automatic style inheriting from
    /// the realm's base. Parent cycles are cut at the style that closes them.
    pub fn link(&mut self, settings: &SettingsStore) {
        let mut i = 0;
        while i < self.styles.len() {
            self.link_style(StyleId(i), settings);
            i += 1;
        }
        self.break_parent_cycles();
    }

    fn link_style(&mut self, id: StyleId, settings: &SettingsStore) {
        let style = &self.styles[id.0];
        let (realm, parent_id, next_id) = (style.realm, style.parent_id.clone(), style.next_id.clone());
        let parent = parent_id.map(|p| self.resolve_or_create(realm, &p, settings));
        let next = next_id.map(|n| self.resolve_or_create(realm, &n, settings));
        let style = &mut self.styles[id.0];
        style.parent = parent;
        style.next = next;
    }

    fn resolve_or_create(&mut self, realm: Realm, local_id: &str, settings: &SettingsStore) -> StyleId {
        if let Some(id) = self.find(realm, local_id) {
            return id;
        }
        log::debug!("{} style {:?} is referenced but never declared", realm, local_id);
        self.declare_linked(StyleDecl::in_realm(realm, local_id).automatic(), settings)
    }

    fn break_parent_cycles(&mut self) {
        for i in 0..self.styles.len() {
            let mut seen = HashSet::from([i]);
            let mut cursor = self.styles[i].parent;
            while let Some(parent) = cursor {
                if parent.0 == i {
                    let base = self.bases.get(self.styles[i].realm);
                    let replacement = (base.0 != i).then_some(base);
                    let replacement_id = replacement.map(|b| self.styles[b.0].local_id.clone());
                    log::warn!(
                        "[{}] is its own ancestor; basing it on the realm base",
                        self.styles[i].section_name()
                    );
                    self.styles[i].parent = replacement;
                    self.styles[i].parent_id = replacement_id;
                    break;
                }
                if !seen.insert(parent.0) {
                    break;
                }
                cursor = self.styles[parent.0].parent;
            }
        }
    }

    /// Looks up a style met during traversal, activating it and counting the use.
    ///
    /// Returns `None` for an absent id and for ignored built-ins. A style
    /// that was never declared is created on the spot.
    pub fn lookup_or_activate(
        &mut self,
        realm: Realm,
        local_id: Option<&str>,
        settings: &mut SettingsStore,
    ) -> Option<StyleId> {
        let local_id = local_id.filter(|id| !id.is_empty())?;
        let id = match self.find(realm, local_id) {
            Some(id) => id,
            None => {
                log::debug!("{} style {:?} met but never declared", realm, local_id);
                self.declare_linked(StyleDecl::in_realm(realm, local_id).used(), settings)
            }
        };
        if is_ignored(realm, &self.styles[id.0].internal_name) {
            return None;
        }
        self.activate(id, settings);
        self.styles[id.0].count += 1;
        Some(id)
    }

    /// Prepares a style for output, once per run. The style counts as used
    /// from then on.
    ///
    /// A parent that was never used is replaced by the realm's base, so the
    /// emitted graph only references styles that are themselves emitted. The
    /// parent is activated first, then the style's settings section is
    /// refreshed, then a used next style is activated.
    pub fn activate(&mut self, id: StyleId, settings: &mut SettingsStore) {
        if self.styles[id.0].activated {
            return;
        }
        self.styles[id.0].activated = true;
        self.styles[id.0].used = true;

        if let Some(parent) = self.styles[id.0].parent {
            let parent = if self.styles[parent.0].used {
                parent
            } else {
                let base = self.bases.get(self.styles[id.0].realm);
                let base_local = self.styles[base.0].local_id.clone();
                let style = &mut self.styles[id.0];
                log::debug!("[{}] leads to unused {:?}", style.section_name(), style.parent_id);
                style.parent = Some(base);
                style.parent_id = Some(base_local);
                base
            };
            self.activate(parent, settings);
        }

        let style = &self.styles[id.0];
        log::debug!("Activating {}", style);
        settings.update_section(&style.section_name(), style);

        let next = style.next;
        match next {
            Some(next) if self.styles[next.0].used => self.activate(next, settings),
            _ => {
                let style = &self.styles[id.0];
                if let Some(next_id) = &style.next_id {
                    log::debug!("[{}] leads to unused {:?}", style.section_name(), next_id);
                }
            }
        }
    }

    pub fn get(&self, id: StyleId) -> Option<&Style> {
        self.styles.get(id.0)
    }

    pub fn find(&self, realm: Realm, local_id: &str) -> Option<StyleId> {
        self.index.get(&(realm, local_id.to_string())).copied()
    }

    /// Finds a style by the name used in settings sections and rule references.
    pub fn find_by_internal_name(&self, realm: Realm, internal_name: &str) -> Option<StyleId> {
        self.styles
            .iter()
            .position(|s| s.realm == realm && s.internal_name == internal_name)
            .map(StyleId)
    }

    /// The base style every realm falls back to.
    pub fn base(&self, realm: Realm) -> StyleId {
        self.bases.get(realm)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (StyleId(i), s))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Number of used styles in `realm`.
    pub fn used_count(&self, realm: Realm) -> usize {
        self.styles.iter().filter(|s| s.realm == realm && s.used).count()
    }
}

impl Index<StyleId> for StyleRegistry {
    type Output = Style;

    fn index(&self, id: StyleId) -> &Style {
        &self.styles[id.0]
    }
}
