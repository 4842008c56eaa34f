//! Persistent settings for tagpress.
//!
//! Every style and rule gets one INI section; a `General` section holds
//! run-level values. The store remembers whether anything changed so an
//! unchanged run leaves the file (and its backup) alone.

mod error;
pub mod fields;
mod store;

pub use error::SettingsError;
pub use fields::{FieldSpec, Persist, Visibility, field_mapping, flag_value, parse_flag};
pub use store::{FlushOutcome, GENERAL_SECTION, SettingsStore};
