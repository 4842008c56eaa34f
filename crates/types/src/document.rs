use serde::{Deserialize, Serialize};

/// Things a reader can tell about a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentProperties {
    /// The document may contain right-to-left text.
    pub has_rtl: bool,
    /// The document text is plain ASCII.
    pub pure_ascii: bool,
}

impl Default for DocumentProperties {
    fn default() -> Self {
        Self {
            has_rtl: true,
            pure_ascii: false,
        }
    }
}
