//! Shared vocabulary for the tagpress crates.
//!
//! Everything here is plain data: the three style realms, the manual
//! formatting bit set, and the declarations/mentions a document reader
//! hands to the style registry.

pub mod decl;
pub mod document;
pub mod format;
pub mod realm;

pub use decl::{StyleDecl, StyleMention};
pub use document::DocumentProperties;
pub use format::{ManualFormat, UnknownFormat};
pub use realm::{Realm, UnknownRealm};
