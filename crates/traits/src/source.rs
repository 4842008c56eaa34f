//! DocumentSource trait: what the converter needs from an input document.

use std::fmt::Debug;
use tagpress_idf::Node;
use tagpress_types::{DocumentProperties, StyleDecl, StyleMention};

/// A parsed input document.
///
/// Readers turn their format into the intermediate document model up front;
/// the converter then walks [`nodes`](Self::nodes) once.
pub trait DocumentSource: Debug {
    fn properties(&self) -> DocumentProperties;

    /// Every style the document declares.
    fn style_definitions(&self) -> Vec<StyleDecl>;

    /// Every style the body references, in first-seen order.
    fn style_mentions(&self) -> Vec<StyleMention> {
        tagpress_idf::style_mentions(self.nodes())
    }

    /// Body paragraphs and tables, in document order.
    fn nodes(&self) -> &[Node];

    /// Returns a human-readable name for this source (for logging/debugging).
    fn name(&self) -> &str;
}
