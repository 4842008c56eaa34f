//! InDesign Tagged Text output.
//!
//! - [`TaggedTextWriter`] builds the tagged text in memory
//! - [`WhitespaceStripper`] trims the leading whitespace of notes
//! - [`text`] holds escaping and the final text transforms and encoding

mod error;
mod stripper;
pub mod text;
mod writer;

pub use error::RenderError;
pub use stripper::WhitespaceStripper;
pub use text::{TextTransforms, encode_utf16le, escape, unescape, write_output};
pub use writer::{Progress, TableShape, TaggedTextWriter, idname};
