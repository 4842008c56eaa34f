//! Knobs consumed by the traversal.

use std::collections::HashMap;
use tagpress_render_tagged::TextTransforms;
use tagpress_style::BaseStyles;
use tagpress_types::ManualFormat;

/// The text direction a document is written in by default.
///
/// Detected formatting matching the default direction is not worth a style
/// of its own, so it is masked out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn format(self) -> ManualFormat {
        match self {
            Direction::Ltr => ManualFormat::LTR,
            Direction::Rtl => ManualFormat::RTL,
        }
    }

    /// The formatting bits that stay visible under this default.
    pub fn mask(self) -> ManualFormat {
        !self.format()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Base style names for the paragraph and character realms. The table
    /// base is always InDesign's basic table style.
    pub base_styles: BaseStyles,
    /// Synthesize styles from manual formatting of paragraphs and spans.
    pub manual: bool,
    /// Synthesize styles from manual formatting of spans only.
    pub manual_light: bool,
    pub direction: Direction,
    /// Stop converting where this text appears. Remembered in the settings
    /// when given; read back from them when not.
    pub stop_marker: Option<String>,
    /// Convert comments into footnotes.
    pub convert_comments: bool,
    /// Paragraph style internal name to text variable name.
    pub style_to_variable: HashMap<String, String>,
    pub transforms: TextTransforms,
}

impl ConvertOptions {
    /// True if spans get synthesized character styles.
    pub fn manual_spans(&self) -> bool {
        self.manual || self.manual_light
    }
}
