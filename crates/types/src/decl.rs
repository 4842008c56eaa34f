//! Style declarations and usage mentions, as produced by document readers.

use crate::format::ManualFormat;
use crate::realm::Realm;
use serde::{Deserialize, Serialize};

/// A raw style definition found in a source document.
///
/// The realm is kept as text: readers may report realms the registry does
/// not know, and the registry decides how to recover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDecl {
    pub realm: String,
    /// Document-local identifier used for parent/next cross references.
    pub local_id: String,
    /// Stable name used for the settings section. Defaults to `local_id`.
    #[serde(default)]
    pub internal_name: String,
    /// Display name. Defaults to the internal name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,
    #[serde(default)]
    pub automatic: bool,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub format: ManualFormat,
    /// Literal output markup replacing the generated placeholder look.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default)]
    pub used: bool,
}

impl StyleDecl {
    pub fn new(realm: impl Into<String>, local_id: impl Into<String>) -> Self {
        let local_id = local_id.into();
        Self {
            realm: realm.into(),
            internal_name: local_id.clone(),
            local_id,
            name: None,
            parent_id: None,
            next_id: None,
            automatic: false,
            custom: false,
            format: ManualFormat::NORMAL,
            markup: None,
            variable: None,
            used: false,
        }
    }

    /// A declaration in a known realm.
    pub fn in_realm(realm: Realm, local_id: impl Into<String>) -> Self {
        Self::new(realm.as_str(), local_id)
    }

    pub fn with_internal_name(mut self, internal_name: impl Into<String>) -> Self {
        self.internal_name = internal_name.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_next(mut self, next_id: impl Into<String>) -> Self {
        self.next_id = Some(next_id.into());
        self
    }

    pub fn with_format(mut self, format: ManualFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Some(markup.into());
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn automatic(mut self) -> Self {
        self.automatic = true;
        self
    }

    pub fn custom(mut self) -> Self {
        self.custom = true;
        self
    }

    pub fn used(mut self) -> Self {
        self.used = true;
        self
    }

    /// The internal name, falling back to the local id when a reader left it blank.
    pub fn effective_internal_name(&self) -> &str {
        if self.internal_name.is_empty() {
            &self.local_id
        } else {
            &self.internal_name
        }
    }
}

/// A `(realm, local_id)` pair reported as used somewhere in the document body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleMention {
    pub realm: Realm,
    pub local_id: String,
}

impl StyleMention {
    pub fn new(realm: Realm, local_id: impl Into<String>) -> Self {
        Self {
            realm,
            local_id: local_id.into(),
        }
    }
}
