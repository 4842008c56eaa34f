//! # tagpress-core
//!
//! The traversal driver of the tagpress converter.
//!
//! A [`Converter`] is built from a [`DocumentSource`](traits::DocumentSource),
//! the persisted [`SettingsStore`](settings::SettingsStore) and
//! [`ConvertOptions`]. Construction prepares the style graph; conversion then
//! walks the document once:
//!
//! - **paragraphs** resolve to a registry style, optionally replaced by a
//!   style synthesized from manual formatting, then rewritten by the first
//!   matching rule
//! - **spans** resolve to character styles the same way, minus rules
//! - **tables** are wrapped in a container paragraph; every cell holds one
//!   paragraph
//! - **footnotes and comments** are converted in a nested scope that is
//!   always closed again, including when the stop marker ends the run early
//! - **images and formulas** go to an [`ArtifactStore`](traits::ArtifactStore);
//!   the text gets their path in a placeholder character style
//!
//! All anomalies short of a missing base style are logged, never fatal.

// Re-export foundation crates
pub use tagpress_idf as idf;
pub use tagpress_render_tagged as render;
pub use tagpress_settings as settings;
pub use tagpress_style as style;
pub use tagpress_traits as traits;
pub use tagpress_types as types;

mod converter;
mod error;
mod options;
mod state;

pub use converter::{ConvertOutput, ConvertStats, Converter};
pub use error::ConvertError;
pub use options::{ConvertOptions, Direction};
pub use state::{Halt, TraversalState};
