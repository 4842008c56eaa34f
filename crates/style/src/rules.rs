//! User-defined style substitution rules.
//!
//! A rule lives in a settings section named `Rule:<description>` and refers
//! to styles with bracketed references such as `[Paragraph:Heading 1]`.

use crate::registry::StyleRegistry;
use crate::style::StyleId;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tagpress_settings::{FieldSpec, Persist, SettingsStore, flag_value, parse_flag};
use tagpress_types::{Realm, StyleDecl};

static STYLE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(?P<realm>\w+):(?P<internal_name>.+)\]$")
        .expect("BUG: style reference regex is invalid")
});

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("BUG: bracket regex is invalid"));

const RULE_PREFIX: &str = "rule:";

/// A parsed `[Realm:internal name]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRef {
    pub realm: Realm,
    pub internal_name: String,
}

impl StyleRef {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = STYLE_REF_RE.captures(text.trim())?;
        let realm = caps["realm"].parse().ok()?;
        Some(Self {
            realm,
            internal_name: caps["internal_name"].to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub mnemonic: String,
    pub description: String,
    pub turn_this: Option<String>,
    pub into_this: Option<String>,
    pub when_following: Option<String>,
    pub when_first_in_doc: bool,
    pub unless_empty: bool,
    pub turn_this_style: Option<StyleId>,
    pub into_this_style: Option<StyleId>,
    pub when_following_styles: Option<Vec<StyleId>>,
    pub valid: bool,
    pub applied: usize,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {:?}>", self.mnemonic, self.description)
    }
}

const RULE_FIELDS: &[FieldSpec] = &[
    FieldSpec::hidden("mnemonic"),
    FieldSpec::hidden("description"),
    FieldSpec::writable("turn_this", "turn_this"),
    FieldSpec::writable("into_this", "into_this"),
    FieldSpec::writable("when_following", "when_following"),
    FieldSpec::writable("when_first_in_doc", "when_first_in_doc"),
    FieldSpec::writable("unless_empty", "unless_empty"),
    FieldSpec::hidden("valid"),
    FieldSpec::hidden("applied"),
];

impl Persist for Rule {
    fn fields() -> &'static [FieldSpec] {
        RULE_FIELDS
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "turn_this" => self.turn_this.clone(),
            "into_this" => self.into_this.clone(),
            "when_following" => self.when_following.clone(),
            "when_first_in_doc" => flag_value(self.when_first_in_doc),
            "unless_empty" => flag_value(self.unless_empty),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: &str) {
        let text = Some(value.to_string()).filter(|v| !v.trim().is_empty());
        match field {
            "turn_this" => self.turn_this = text,
            "into_this" => self.into_this = text,
            "when_following" => self.when_following = text,
            "when_first_in_doc" => self.when_first_in_doc = parse_flag(value),
            "unless_empty" => self.unless_empty = parse_flag(value),
            other => log::debug!("{} ignoring field {:?}", self, other),
        }
    }
}

/// Why a rule could not be linked.
#[derive(Debug)]
enum BadReference {
    Missing(&'static str),
    Malformed(String),
    Unknown(String),
}

impl fmt::Display for BadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadReference::Missing(field) => write!(f, "missing {}", field),
            BadReference::Malformed(text) => write!(f, "malformed reference {:?}", text),
            BadReference::Unknown(text) => write!(f, "unknown style {}", text),
        }
    }
}

/// What the traversal knows about the paragraph a rule is tested against.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext {
    /// Resolved style of the previous paragraph.
    pub previous: Option<StyleId>,
    pub paragraph_blank: bool,
}

/// Rules in settings order.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Reads every `Rule:` section of `settings`.
    pub fn from_settings(settings: &SettingsStore) -> Self {
        let mut rules = Vec::new();
        for section in settings.sections() {
            let Some(prefix) = section.get(..RULE_PREFIX.len()) else {
                continue;
            };
            if !prefix.eq_ignore_ascii_case(RULE_PREFIX) {
                continue;
            }
            let mut rule = Rule {
                mnemonic: format!("R{}", rules.len() + 1),
                description: section[RULE_PREFIX.len()..].to_string(),
                valid: true,
                ..Rule::default()
            };
            settings.read_fields(section, &mut rule, true);
            log::debug!("Loaded {}", rule);
            rules.push(rule);
        }
        Self { rules }
    }

    /// Resolves style references. Rules with bad references are disabled.
    ///
    /// A missing `into_this` target is created as a child of `turn_this`.
    pub fn link(&mut self, registry: &mut StyleRegistry, settings: &SettingsStore) {
        for rule in &mut self.rules {
            if let Err(err) = link_rule(rule, registry, settings) {
                log::warn!("Ignoring rule {} with bad references: {}", rule, err);
                rule.valid = false;
            }
        }
    }

    /// Substitutes `style` by the first applicable rule's target.
    pub fn apply(&mut self, registry: &StyleRegistry, style: StyleId, ctx: &RuleContext) -> StyleId {
        for rule in &mut self.rules {
            if applies(rule, registry, style, ctx) {
                if let Some(into) = rule.into_this_style {
                    rule.applied += 1;
                    log::debug!("{} turns {} into {}", rule, registry[style], registry[into]);
                    return into;
                }
            }
        }
        style
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn applies(rule: &Rule, registry: &StyleRegistry, style: StyleId, ctx: &RuleContext) -> bool {
    if !rule.valid || rule.turn_this_style != Some(style) {
        return false;
    }
    if rule.when_first_in_doc && registry[style].count != 1 {
        return false;
    }
    if rule.unless_empty && ctx.paragraph_blank {
        return false;
    }
    if let Some(following) = &rule.when_following_styles {
        match ctx.previous {
            Some(previous) if following.contains(&previous) => {}
            _ => return false,
        }
    }
    true
}

fn link_rule(
    rule: &mut Rule,
    registry: &mut StyleRegistry,
    settings: &SettingsStore,
) -> Result<(), BadReference> {
    let turn_this = required(&rule.turn_this, "turn_this")?;
    let turn_this_style = find_by_ref(registry, turn_this)?;

    let into_this = required(&rule.into_this, "into_this")?;
    let into_this_style = match find_by_ref(registry, into_this) {
        Ok(id) => id,
        Err(BadReference::Unknown(_)) => {
            let target = parse_ref(into_this)?;
            let parent = registry[turn_this_style].local_id.clone();
            log::debug!("{} creates {}", rule, into_this);
            let decl = StyleDecl::in_realm(target.realm, into_this.trim())
                .with_internal_name(target.internal_name)
                .with_parent(parent)
                .used();
            registry.declare_linked(decl, settings)
        }
        Err(err) => return Err(err),
    };

    let when_following_styles = match &rule.when_following {
        Some(text) => {
            let refs: Vec<_> = BRACKETED_RE.find_iter(text).map(|m| m.as_str()).collect();
            if refs.is_empty() {
                return Err(BadReference::Malformed(text.clone()));
            }
            let styles = refs
                .into_iter()
                .map(|r| find_by_ref(registry, r))
                .collect::<Result<Vec<_>, _>>()?;
            Some(styles)
        }
        None => None,
    };

    rule.turn_this_style = Some(turn_this_style);
    rule.into_this_style = Some(into_this_style);
    rule.when_following_styles = when_following_styles;
    Ok(())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, BadReference> {
    value.as_deref().ok_or(BadReference::Missing(field))
}

fn parse_ref(text: &str) -> Result<StyleRef, BadReference> {
    StyleRef::parse(text).ok_or_else(|| BadReference::Malformed(text.to_string()))
}

fn find_by_ref(registry: &StyleRegistry, text: &str) -> Result<StyleId, BadReference> {
    let target = parse_ref(text)?;
    registry
        .find_by_internal_name(target.realm, &target.internal_name)
        .ok_or_else(|| BadReference::Unknown(text.to_string()))
}
