/// Drops the whitespace a note starts with.
///
/// Everything after the first non-whitespace text passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceStripper {
    begun: bool,
}

impl WhitespaceStripper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strip<'a>(&mut self, text: &'a str) -> &'a str {
        if self.begun {
            return text;
        }
        let text = text.trim_start();
        self.begun = !text.is_empty();
        text
    }

    pub fn has_begun(&self) -> bool {
        self.begun
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_until_first_text() {
        let mut stripper = WhitespaceStripper::new();
        assert_eq!(stripper.strip("  "), "");
        assert!(!stripper.has_begun());
        assert_eq!(stripper.strip("\t note "), "note ");
        assert_eq!(stripper.strip("  more"), "  more");
    }
}
