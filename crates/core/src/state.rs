//! Per-scope traversal state.
//!
//! The document body is one scope; every footnote or comment opens a nested
//! one. Scopes form a stack: the innermost is current, and leaving a note
//! restores the one that was current before it.

use std::mem;
use tagpress_render_tagged::WhitespaceStripper;
use tagpress_style::StyleId;
use tagpress_types::ManualFormat;

/// Returned up the traversal when the stop marker is met.
///
/// Not an error: the converter resolves it and finishes the output normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt;

#[derive(Debug, Clone, Default)]
pub struct TraversalState {
    /// Character style in effect.
    pub char_style: Option<StyleId>,
    /// Resolved style of the previous paragraph, after rules.
    pub previous: Option<StyleId>,
    /// The current paragraph has produced no visible text yet.
    pub is_empty: bool,
    /// The last non-empty paragraph ended with a page break.
    pub post_break: bool,
    /// The previous paragraph was empty.
    pub post_empty: bool,
    /// Span formatting the current paragraph style already carries.
    pub para_char_format: ManualFormat,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    pub state: TraversalState,
    /// Notes drop their leading whitespace; the body keeps it.
    pub stripper: Option<WhitespaceStripper>,
}

impl Scope {
    fn note() -> Self {
        Self {
            state: TraversalState::default(),
            stripper: Some(WhitespaceStripper::new()),
        }
    }

    /// Text as it should reach the writer.
    pub fn filter<'a>(&mut self, text: &'a str) -> &'a str {
        match &mut self.stripper {
            Some(stripper) => stripper.strip(text),
            None => text,
        }
    }
}

/// The current scope plus the ones it interrupted.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    current: Scope,
    outer: Vec<Scope>,
}

impl ScopeStack {
    pub fn current(&mut self) -> &mut Scope {
        &mut self.current
    }

    pub fn state(&mut self) -> &mut TraversalState {
        &mut self.current.state
    }

    pub fn push_note(&mut self) {
        let outer = mem::replace(&mut self.current, Scope::note());
        self.outer.push(outer);
    }

    pub fn pop(&mut self) {
        match self.outer.pop() {
            Some(outer) => self.current = outer,
            None => log::error!("Leaving the document scope"),
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.outer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_nest_and_restore() {
        let mut scopes = ScopeStack::default();
        scopes.state().post_empty = true;

        scopes.push_note();
        assert_eq!(scopes.depth(), 1);
        assert!(!scopes.state().post_empty);
        assert_eq!(scopes.current().filter("  text"), "text");

        scopes.push_note();
        scopes.state().is_empty = true;
        scopes.pop();
        assert!(!scopes.state().is_empty);
        assert_eq!(scopes.current().filter("  more"), "  more");

        scopes.pop();
        assert_eq!(scopes.depth(), 0);
        assert!(scopes.state().post_empty);
        assert_eq!(scopes.current().filter("  body"), "  body");
    }

    #[test]
    fn test_popping_the_root_keeps_it() {
        let mut scopes = ScopeStack::default();
        scopes.state().post_break = true;
        scopes.pop();
        assert!(scopes.state().post_break);
    }
}
