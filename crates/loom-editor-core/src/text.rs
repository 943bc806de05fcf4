//! Rope-backed scratch buffer for edits the editor makes on its own.
//!
//! The editing surface owns the live text; smart edits load it here, splice by
//! char offsets, and hand the result back as a new text value.

use std::ops::Range;

use smol_str::{SmolStr, ToSmolStr};

use crate::types::Selection;

/// Text buffer addressed in chars (Unicode scalar values).
#[derive(Clone, Debug, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Get a slice as SmolStr. Returns None if range is out of bounds.
    pub fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    /// Replace the selected text, returning a caret after the inserted text.
    ///
    /// The selection is clamped to the buffer first.
    pub fn replace(&mut self, selection: Selection, text: &str) -> Selection {
        let range = selection.clamped(self.len_chars()).to_range();
        self.rope.remove(range.clone());
        self.rope.insert(range.start, text);
        Selection::collapsed(range.start + text.chars().count())
    }

    pub fn char_to_byte(&self, char_offset: usize) -> usize {
        self.rope.char_to_byte(char_offset.min(self.len_chars()))
    }

    pub fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_char(byte_offset.min(self.len_bytes()))
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl std::fmt::Display for EditorRope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

/// Length of `text` in chars.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_selection() {
        let mut rope = EditorRope::from("hello world");
        let caret = rope.replace(Selection::new(11, 6), "rust");
        assert_eq!(rope.to_string(), "hello rust");
        assert_eq!(caret, Selection::collapsed(10));
    }

    #[test]
    fn test_replace_clamps_selection() {
        let mut rope = EditorRope::from("abc");
        let caret = rope.replace(Selection::collapsed(99), "!");
        assert_eq!(rope.to_string(), "abc!");
        assert_eq!(caret, Selection::collapsed(4));
    }

    #[test]
    fn test_offsets_with_multibyte() {
        let rope = EditorRope::from("hé🌍x");
        assert_eq!(rope.len_chars(), 4);
        assert_eq!(rope.char_to_byte(2), 3);
        assert_eq!(rope.char_to_byte(3), 7);
        assert_eq!(rope.byte_to_char(7), 3);
        assert_eq!(rope.slice(1..3).as_deref(), Some("é🌍"));
        assert_eq!(rope.slice(2..9), None);
    }
}
