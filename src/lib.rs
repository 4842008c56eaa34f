//! # tagpress
//!
//! Converts word-processor documents into InDesign Tagged Text.
//!
//! Styles met in a document are recorded in a settings file next to the
//! output, where their names and markup can be edited and rules added; the
//! next run picks the edits up. See [`ConversionBuilder`] for the entry point.

// Re-export workspace crates
pub use tagpress_core as core;
pub use tagpress_idf as idf;
pub use tagpress_render_tagged as render;
pub use tagpress_resource as resource;
pub use tagpress_settings as settings;
pub use tagpress_source as source;
pub use tagpress_style as style;
pub use tagpress_traits as traits;
pub use tagpress_types as types;

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{Conversion, ConversionBuilder, ConversionReport};
pub use tagpress_core::{ConvertOptions, Direction};
