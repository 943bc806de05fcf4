//! Edits the editor writes on the user's behalf.
//!
//! All offsets are chars. Results carry the full new text; the caller feeds it
//! back through the normal text-changed path.

use crate::highlight::Markers;
use crate::text::EditorRope;
use crate::types::Selection;

/// Prefix that marks a link destination as a note attachment.
pub const ATTACHMENT_PREFIX: &str = "attachment:";

/// New text and selection after a smart edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartEdit {
    pub text: String,
    pub selection: Selection,
}

/// Replace the selection with an image referencing attachment `name`.
pub fn insert_image(text: &str, selection: Selection, alt: &str, name: &str) -> SmartEdit {
    let dest = if name.chars().any(char::is_whitespace) {
        format!("<{ATTACHMENT_PREFIX}{name}>")
    } else {
        format!("{ATTACHMENT_PREFIX}{name}")
    };
    let mut rope = EditorRope::from(text);
    let selection = rope.replace(selection, &format!("![{alt}]({dest})"));
    SmartEdit {
        text: rope.to_string(),
        selection,
    }
}

/// Surround the selection with `marker`, or remove it if already surrounded.
///
/// A collapsed selection gets an empty marker pair with the caret inside.
pub fn wrap_selection(text: &str, selection: Selection, marker: &str) -> SmartEdit {
    let mut rope = EditorRope::from(text);
    let selection = selection.clamped(rope.len_chars());
    let (start, end) = (selection.start(), selection.end());
    let marker_len = marker.chars().count();

    let before = start
        .checked_sub(marker_len)
        .and_then(|s| rope.slice(s..start));
    let after = rope.slice(end..end + marker_len);

    if marker_len > 0 && before.as_deref() == Some(marker) && after.as_deref() == Some(marker) {
        rope.replace(Selection::new(end, end + marker_len), "");
        rope.replace(Selection::new(start - marker_len, start), "");
        return SmartEdit {
            text: rope.to_string(),
            selection: Selection::new(start - marker_len, end - marker_len),
        };
    }

    rope.replace(Selection::collapsed(end), marker);
    rope.replace(Selection::collapsed(start), marker);
    SmartEdit {
        text: rope.to_string(),
        selection: Selection::new(start + marker_len, end + marker_len),
    }
}

/// Toggle emphasis using the user's preferred marker.
pub fn toggle_emphasis(text: &str, selection: Selection, markers: &Markers) -> SmartEdit {
    wrap_selection(text, selection, &markers.emphasis)
}

/// Toggle strong emphasis using the user's preferred marker.
pub fn toggle_strong(text: &str, selection: Selection, markers: &Markers) -> SmartEdit {
    wrap_selection(text, selection, &markers.strong)
}

/// Start a list item with the user's bullet at the selection, on a new line
/// unless the selection already starts one.
pub fn insert_list_item(text: &str, selection: Selection, markers: &Markers) -> SmartEdit {
    let mut rope = EditorRope::from(text);
    let selection = selection.clamped(rope.len_chars());
    let start = selection.start();
    let at_line_start = start == 0 || rope.slice(start - 1..start).as_deref() == Some("\n");
    let item = if at_line_start {
        format!("{} ", markers.bullet)
    } else {
        format!("\n{} ", markers.bullet)
    };
    let selection = rope.replace(selection, &item);
    SmartEdit {
        text: rope.to_string(),
        selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_image_replaces_selection() {
        let edit = insert_image("see X here", Selection::new(4, 5), "cat", "cat.png");
        assert_eq!(edit.text, "see ![cat](attachment:cat.png) here");
        assert_eq!(edit.selection, Selection::collapsed(30));
    }

    #[test]
    fn test_list_item_uses_bullet_marker() {
        let markers = Markers {
            bullet: "*".into(),
            ..Markers::default()
        };
        let edit = insert_list_item("one", Selection::collapsed(3), &markers);
        assert_eq!(edit.text, "one\n* ");
        assert_eq!(edit.selection, Selection::collapsed(6));

        let edit = insert_list_item("one\n", Selection::collapsed(4), &markers);
        assert_eq!(edit.text, "one\n* ");
    }

    #[test]
    fn test_insert_image_name_with_space() {
        let edit = insert_image("", Selection::collapsed(0), "a", "my pic.png");
        assert_eq!(edit.text, "![a](<attachment:my pic.png>)");
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let wrapped = wrap_selection("say hi now", Selection::new(4, 6), "**");
        assert_eq!(wrapped.text, "say **hi** now");
        assert_eq!(wrapped.selection, Selection::new(6, 8));

        let unwrapped = wrap_selection(&wrapped.text, wrapped.selection, "**");
        assert_eq!(unwrapped.text, "say hi now");
        assert_eq!(unwrapped.selection, Selection::new(4, 6));
    }

    #[test]
    fn test_wrap_collapsed_places_caret_inside() {
        let edit = toggle_emphasis("ab", Selection::collapsed(1), &Markers::default());
        assert_eq!(edit.text, "a__b");
        assert_eq!(edit.selection, Selection::collapsed(2));
    }

    #[test]
    fn test_wrap_at_document_edges() {
        let edit = toggle_strong("bold", Selection::new(0, 4), &Markers::default());
        assert_eq!(edit.text, "**bold**");
    }
}
