//! Styles the converter itself introduces, all grouped under [`SPECIAL_GROUP`].

use crate::registry::StyleRegistry;
use crate::style::StyleId;
use tagpress_settings::SettingsStore;
use tagpress_types::{Realm, StyleDecl};

/// Style group prefix for everything the converter generates.
pub const SPECIAL_GROUP: &str = "(tagpress)";

pub const COMMENT_TEXT_STYLE: &str = "(tagpress)/(Comment Text)";

struct SpecialStyle {
    realm: Realm,
    name: &'static str,
    parent: Option<&'static str>,
    markup: &'static str,
}

macro_rules! special {
    ($realm:ident, $name:literal, $markup:literal) => {
        special!($realm, $name, None, $markup)
    };
    ($realm:ident, $name:literal, $parent:expr, $markup:literal) => {
        SpecialStyle {
            realm: Realm::$realm,
            name: concat!("(tagpress)/", $name),
            parent: $parent,
            markup: $markup,
        }
    };
}

const FOOTNOTE_REFERENCE: SpecialStyle = special!(
    Character,
    "(Footnote Reference in Text)",
    "<cColor:Magenta><cColorTint:100><cPosition:Superscript>"
);
const COMMENT_REFERENCE: SpecialStyle = special!(
    Character,
    "(Comment Reference)",
    Some(FOOTNOTE_REFERENCE.name),
    "<cColor:Cyan><cColorTint:100>"
);
const IMAGE: SpecialStyle = special!(Character, "(Image)", "<cColor:Yellow><cColorTint:100>");
const FORMULA: SpecialStyle = special!(Character, "(Formula)", "<cColor:Yellow><cColorTint:100>");
const TABLE_CONTAINER: SpecialStyle = special!(Paragraph, "(Table Container)", "");

/// Handles to the converter's own styles. Each counts as used once the
/// converter activates it.
#[derive(Debug, Clone, Copy)]
pub struct SpecialStyles {
    pub footnote_reference: StyleId,
    pub comment_reference: StyleId,
    pub image: StyleId,
    pub formula: StyleId,
    pub table_container: StyleId,
}

impl SpecialStyles {
    /// Declares every special style. Their settings sections can still rename
    /// or restyle them.
    pub fn declare(registry: &mut StyleRegistry, settings: &SettingsStore) -> Self {
        let mut declare = |special: &SpecialStyle| {
            let mut decl = StyleDecl::in_realm(special.realm, special.name)
                .with_markup(special.markup)
                .automatic();
            if let Some(parent) = special.parent {
                decl = decl.with_parent(parent);
            }
            registry.declare_linked(decl, settings)
        };
        Self {
            footnote_reference: declare(&FOOTNOTE_REFERENCE),
            comment_reference: declare(&COMMENT_REFERENCE),
            image: declare(&IMAGE),
            formula: declare(&FORMULA),
            table_container: declare(&TABLE_CONTAINER),
        }
    }
}
