use std::fmt;
use tagpress_settings::{FieldSpec, Persist, flag_value, parse_flag};
use tagpress_types::{ManualFormat, Realm};

/// A stable handle into the [`StyleRegistry`](crate::StyleRegistry) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub(crate) usize);

impl StyleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A character, paragraph or table style.
///
/// Identity is `(realm, local_id)`. The `parent`/`next` handles are filled in
/// by linking and may be rewritten by activation; everything else is fixed
/// at declaration time apart from the usage bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub realm: Realm,
    pub local_id: String,
    pub internal_name: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub next_id: Option<String>,
    pub automatic: bool,
    pub custom: bool,
    pub format: ManualFormat,
    pub markup: String,
    pub variable: Option<String>,
    pub used: bool,
    pub count: usize,
    pub parent: Option<StyleId>,
    pub next: Option<StyleId>,
    pub(crate) activated: bool,
}

impl Style {
    /// The settings section holding this style: `Realm:internal name`.
    pub fn section_name(&self) -> String {
        section_name(self.realm, &self.internal_name)
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }
}

pub fn section_name(realm: Realm, internal_name: &str) -> String {
    format!("{}:{}", realm.title(), internal_name)
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.custom {
            write!(f, "<{} {:?}>", self.realm, self.name)
        } else {
            write!(f, "<{} {:?} (built-in)>", self.realm, self.name)
        }
    }
}

const STYLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::hidden("realm"),
    FieldSpec::readonly("local_id", "local_id"),
    FieldSpec::hidden("internal_name"),
    FieldSpec::writable("name", "name"),
    FieldSpec::readonly("parent_id", "parent"),
    FieldSpec::readonly("next_id", "next"),
    FieldSpec::readonly("automatic", "automatic"),
    FieldSpec::readonly("custom", "custom"),
    FieldSpec::readonly("format", "format"),
    FieldSpec::writable("markup", "markup"),
    FieldSpec::writable("variable", "variable"),
    FieldSpec::hidden("used"),
    FieldSpec::hidden("count"),
    FieldSpec::hidden("parent"),
    FieldSpec::hidden("next"),
];

impl Persist for Style {
    fn fields() -> &'static [FieldSpec] {
        STYLE_FIELDS
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "local_id" => Some(self.local_id.clone()),
            "name" => Some(self.name.clone()),
            "parent_id" => self.parent_id.clone(),
            "next_id" => self.next_id.clone(),
            "automatic" => flag_value(self.automatic),
            "custom" => flag_value(self.custom),
            "format" => (!self.format.is_empty()).then(|| self.format.to_string()),
            "markup" => Some(self.markup.clone()),
            "variable" => self.variable.clone(),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: &str) {
        match field {
            "name" => self.name = value.to_string(),
            "markup" => self.markup = value.to_string(),
            "variable" => self.variable = Some(value.to_string()).filter(|v| !v.is_empty()),
            "parent_id" => self.parent_id = Some(value.to_string()),
            "next_id" => self.next_id = Some(value.to_string()),
            "automatic" => self.automatic = parse_flag(value),
            "custom" => self.custom = parse_flag(value),
            "format" => match value.parse() {
                Ok(format) => self.format = format,
                Err(err) => log::warn!("[{}] {}", self.section_name(), err),
            },
            other => log::debug!("[{}] ignoring field {:?}", self.section_name(), other),
        }
    }
}
