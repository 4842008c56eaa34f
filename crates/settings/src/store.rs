use crate::error::SettingsError;
use crate::fields::{Persist, field_mapping};
use ini::{Ini, Properties};
use std::path::{Path, PathBuf};

/// Section holding run-level values such as the stop marker.
pub const GENERAL_SECTION: &str = "General";

/// What `flush` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing changed and the file already existed; it was left alone.
    Unchanged,
    /// The file was (re)written, after copying the old one to `backup` if any.
    Written { backup: Option<PathBuf> },
}

/// A section-keyed key/value store persisted as an INI file.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    ini: Ini,
    existed: bool,
    touched: bool,
}

impl SettingsStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ini: Ini::new(),
            existed: false,
            touched: false,
        }
    }

    /// Loads `path`. A missing file yields an empty store; a file that cannot
    /// be parsed is logged and treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        if !path.is_file() {
            log::debug!("No settings at {}, starting empty", path.display());
            return Ok(Self {
                path: Some(path),
                ..Self::in_memory()
            });
        }

        log::info!("Reading {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let ini = Ini::load_from_str(&text).unwrap_or_else(|err| {
            log::warn!("Ignoring malformed settings in {}: {}", path.display(), err);
            Ini::new()
        });
        Ok(Self {
            path: Some(path),
            ini,
            existed: true,
            touched: false,
        })
    }

    /// Starts from scratch, ignoring whatever `path` currently holds. The old
    /// file is still backed up when the new one is written.
    pub fn fresh(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            existed: path.is_file(),
            path: Some(path),
            ..Self::in_memory()
        }
    }

    /// Parses settings text into a store with no backing file.
    pub fn parse(text: &str) -> Self {
        let ini = Ini::load_from_str(text).unwrap_or_else(|err| {
            log::warn!("Ignoring malformed settings: {}", err);
            Ini::new()
        });
        Self {
            ini,
            ..Self::in_memory()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once anything differs from what was loaded.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.ini.section(Some(section)).is_some()
    }

    /// Names of all sections, in file order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.ini.sections().flatten()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.section(Some(section))?.get(key)
    }

    /// Sets one value; an empty value removes the key.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let props = self.section_entry(section);
        let changed = store_value(props, key, Some(value));
        self.touched |= changed;
    }

    /// Makes sure `section` exists.
    pub fn ensure_section(&mut self, section: &str) {
        self.section_entry(section);
    }

    /// Writes every persisted field of `item` into `section`.
    ///
    /// Empty values are removed rather than stored. Any difference from the
    /// stored text marks the store as touched.
    pub fn update_section<T: Persist>(&mut self, section: &str, item: &T) {
        let props = self.section_entry(section);
        let mut changed = false;
        for (spec, key) in field_mapping::<T>(false) {
            let value = item.field_value(spec.field);
            changed |= store_value(props, &key, value.as_deref());
        }
        if changed {
            log::debug!("Settings section [{}] updated", section);
        }
        self.touched |= changed;
    }

    /// Applies the stored values in `section` to `item`; returns how many applied.
    ///
    /// A missing section applies nothing.
    pub fn read_fields<T: Persist>(&self, section: &str, item: &mut T, writable_only: bool) -> usize {
        let Some(props) = self.ini.section(Some(section)) else {
            return 0;
        };
        let mut applied = 0;
        for (spec, key) in field_mapping::<T>(writable_only) {
            if let Some(value) = props.get(&*key) {
                item.set_field(spec.field, value);
                applied += 1;
            }
        }
        applied
    }

    /// Renders the store as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.ini.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Writes the store back to its file.
    ///
    /// An untouched store whose file already exists is left alone. When the
    /// file existed and something changed, it is copied to a `.bak` sibling
    /// before being overwritten.
    pub fn flush(&mut self) -> Result<FlushOutcome, SettingsError> {
        let path = self.path.clone().ok_or(SettingsError::NoPath)?;
        if self.existed && !self.touched {
            log::debug!("Settings unchanged, not rewriting {}", path.display());
            return Ok(FlushOutcome::Unchanged);
        }

        let mut backup = None;
        if self.existed && path.is_file() {
            let bak = path.with_extension("bak");
            log::debug!("Backing up {}", path.display());
            std::fs::copy(&path, &bak).map_err(|source| SettingsError::Write {
                path: bak.clone(),
                source,
            })?;
            backup = Some(bak);
        }

        log::info!("Writing {}", path.display());
        std::fs::write(&path, self.to_ini_string()).map_err(|source| SettingsError::Write {
            path: path.clone(),
            source,
        })?;
        self.existed = true;
        self.touched = false;
        Ok(FlushOutcome::Written { backup })
    }

    fn section_entry(&mut self, section: &str) -> &mut Properties {
        if self.ini.section(Some(section)).is_none() {
            self.touched = true;
        }
        self.ini
            .entry(Some(section.to_string()))
            .or_insert_with(Properties::new)
    }
}

/// Stores or removes one value; returns whether the section changed.
fn store_value(props: &mut Properties, key: &str, value: Option<&str>) -> bool {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => {
            if props.get(key) == Some(value) {
                false
            } else {
                props.insert(key.to_string(), value.to_string());
                true
            }
        }
        None => props.remove(key).is_some(),
    }
}
