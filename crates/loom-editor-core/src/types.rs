//! Core editor types: selection and line separators.
//!
//! These types are framework-agnostic and can be used with any editing surface.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Text selection with anchor and head positions.
///
/// Offsets are in chars, not bytes. The anchor is where the selection
/// started, the head is where the caret is now. They may be in any order -
/// use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where the caret is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (caret position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (caret only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Clamp both ends to `len`, keeping the direction.
    ///
    /// Used when the text under a selection is replaced wholesale.
    pub fn clamped(&self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

/// Newline style of a document as it exists outside the editor.
///
/// Inside the editor text is always LF-normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    #[default]
    Lf,
    Crlf,
}

impl LineSeparator {
    /// The separator's bytes.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::Crlf => "\r\n",
        }
    }

    /// Parse a user-facing name (`lf`, `crlf`, case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lf" | "\\n" | "unix" => Some(LineSeparator::Lf),
            "crlf" | "\\r\\n" | "windows" => Some(LineSeparator::Crlf),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineSeparator::Lf => f.write_str("LF"),
            LineSeparator::Crlf => f.write_str("CRLF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        // Forward selection
        let sel = Selection::new(5, 10);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);

        // Backward selection
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert_eq!(sel.to_range(), 5..10);
    }

    #[test]
    fn test_selection_collapsed() {
        let sel = Selection::collapsed(7);
        assert!(sel.is_collapsed());
        assert!(sel.is_empty());
        assert_eq!(sel.len(), 0);
    }

    #[test]
    fn test_selection_clamped() {
        let sel = Selection::new(12, 3).clamped(5);
        assert_eq!(sel, Selection::new(5, 3));
    }

    #[test]
    fn test_separator_names() {
        assert_eq!(LineSeparator::from_name("CRLF"), Some(LineSeparator::Crlf));
        assert_eq!(LineSeparator::from_name(" lf "), Some(LineSeparator::Lf));
        assert_eq!(LineSeparator::from_name("cr"), None);
        assert_eq!(LineSeparator::Crlf.to_string(), "CRLF");
    }
}
