//! Anonymous styles standing in for ad-hoc formatting.

use crate::registry::StyleRegistry;
use crate::special::SPECIAL_GROUP;
use crate::style::StyleId;
use std::collections::HashMap;
use tagpress_settings::SettingsStore;
use tagpress_types::{ManualFormat, Realm, StyleDecl};

/// Cache key of a synthesized style: the residual formatting and the custom
/// style it was applied on top of, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManualFormatCustomStyle {
    pub format: ManualFormat,
    pub base: Option<StyleId>,
}

/// Memo of synthesized styles; one per distinct [`ManualFormatCustomStyle`].
#[derive(Debug, Default)]
pub struct ManualStyles {
    cache: HashMap<ManualFormatCustomStyle, StyleId>,
}

impl ManualStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the style to use for `format` applied on top of `base`.
    ///
    /// Only custom bases are composed against; a built-in base is treated as
    /// absent. Formatting the base already encodes is not repeated. With
    /// nothing left to express, a character span keeps its custom base (or
    /// none) while a paragraph gets a `NORMAL` style so it always resolves to
    /// something.
    pub fn synthesize(
        &mut self,
        registry: &mut StyleRegistry,
        settings: &SettingsStore,
        realm: Realm,
        base: Option<StyleId>,
        format: ManualFormat,
    ) -> Option<StyleId> {
        let custom_base = base.filter(|id| registry[*id].custom);
        let format = match custom_base {
            Some(id) => format - registry[id].format,
            None => format,
        };

        if format.is_empty() && (realm != Realm::Paragraph || custom_base.is_some()) {
            return custom_base;
        }

        let key = ManualFormatCustomStyle {
            format,
            base: custom_base,
        };
        if let Some(id) = self.cache.get(&key) {
            return Some(*id);
        }

        let (name, parent) = match custom_base {
            Some(id) => {
                let base = &registry[id];
                (
                    format!("{}/{} ({})", SPECIAL_GROUP, base.name, format.style_suffix()),
                    base.local_id.clone(),
                )
            }
            None => (
                format!("{}/({})", SPECIAL_GROUP, format.style_suffix()),
                registry[registry.base(realm)].local_id.clone(),
            ),
        };
        log::debug!("Synthesizing {} style {:?} for {}", realm, name, format);

        let decl = StyleDecl::in_realm(realm, name.clone())
            .with_internal_name(name)
            .with_parent(parent)
            .with_format(format)
            .automatic()
            .used();
        let id = registry.declare_linked(decl, settings);
        self.cache.insert(key, id);
        Some(id)
    }

    /// Number of distinct styles synthesized so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
