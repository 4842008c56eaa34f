//! Static field tables describing how an entity is persisted.

use std::borrow::Cow;

/// How a field is exposed in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Written, and read back as an override.
    Writable,
    /// Written with a ` (readonly)` key suffix for visibility; never read back
    /// as an override unless explicitly requested.
    ReadOnly,
    /// Never persisted.
    Hidden,
}

/// One persistable attribute of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: &'static str,
    pub key: &'static str,
    pub visibility: Visibility,
}

impl FieldSpec {
    pub const fn writable(field: &'static str, key: &'static str) -> Self {
        Self { field, key, visibility: Visibility::Writable }
    }

    pub const fn readonly(field: &'static str, key: &'static str) -> Self {
        Self { field, key, visibility: Visibility::ReadOnly }
    }

    pub const fn hidden(field: &'static str) -> Self {
        Self { field, key: field, visibility: Visibility::Hidden }
    }

    /// The key used in the settings file, or `None` for hidden fields.
    pub fn external_key(&self) -> Option<Cow<'static, str>> {
        match self.visibility {
            Visibility::Writable => Some(Cow::Borrowed(self.key)),
            Visibility::ReadOnly => Some(Cow::Owned(format!("{} (readonly)", self.key))),
            Visibility::Hidden => None,
        }
    }
}

/// An entity whose attributes round-trip through a settings section.
pub trait Persist {
    /// The entity's field table. Built once; never derived at runtime.
    fn fields() -> &'static [FieldSpec];

    /// The current value of `field` as text. `None` or empty means "absent".
    fn field_value(&self, field: &str) -> Option<String>;

    /// Applies a stored value to `field`.
    fn set_field(&mut self, field: &str, value: &str);
}

/// Yields `(field spec, external key)` for each persisted field of `T`.
///
/// With `writable_only`, read-only fields are skipped too.
pub fn field_mapping<T: Persist>(
    writable_only: bool,
) -> impl Iterator<Item = (&'static FieldSpec, Cow<'static, str>)> {
    T::fields().iter().filter_map(move |spec| {
        if writable_only && spec.visibility == Visibility::ReadOnly {
            return None;
        }
        spec.external_key().map(|key| (spec, key))
    })
}

/// Reads a stored boolean. Accepts `true`/`yes`/`on`/`1` in any case.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

/// Renders a boolean for storage; `false` is stored as absent.
pub fn flag_value(flag: bool) -> Option<String> {
    flag.then(|| "true".to_string())
}
