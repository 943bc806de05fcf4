//! Editing session: which note is loaded and whether it has unsaved edits.

use crate::attachments::{AttachmentFingerprint, Note};
use crate::error::SessionError;
use crate::separator::normalize;

/// Outcome of offering a note to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteChange {
    /// The session was clean; the editor must show this text.
    Replace(String),
    /// Same note whose content caught up with the edits. The session is clean
    /// again and the editor keeps its text.
    Synced,
    /// Same note updated underneath unsaved edits; the edits are kept.
    Kept,
    /// A different note while edits are unsaved. Nothing changed.
    Refused,
}

/// Dirty and enabled tracking for the loaded note.
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    note: Option<Note>,
    text: String,
    dirty: bool,
    enabled: bool,
}

impl EditingSession {
    /// A disabled session with no note loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a note (or no note) to the session.
    pub fn set_note(&mut self, note: Option<Note>) -> NoteChange {
        let same_note = self.note.as_ref().map(|n| &n.id) == note.as_ref().map(|n| &n.id);
        if self.dirty && !same_note {
            tracing::warn!(
                target: "loom::session",
                current = ?self.note.as_ref().map(|n| &n.id),
                new = ?note.as_ref().map(|n| &n.id),
                "attempt to change note while dirty"
            );
            return NoteChange::Refused;
        }

        let content = note.as_ref().map(|n| n.content.as_str()).unwrap_or_default();
        let change = if !self.dirty {
            self.text = content.to_owned();
            NoteChange::Replace(self.text.clone())
        } else if self.note.is_some() && same_content(&self.text, content) {
            self.dirty = false;
            NoteChange::Synced
        } else {
            NoteChange::Kept
        };
        self.note = note;
        change
    }

    /// Record the editor's text.
    ///
    /// Fails when editing is disabled and the text differs from the note.
    pub fn set_text(&mut self, text: &str) -> Result<(), SessionError> {
        let same_as_note = self
            .note
            .as_ref()
            .is_some_and(|n| same_content(&n.content, text));
        if !same_as_note && !self.enabled {
            return Err(SessionError::EditingDisabled);
        }
        text.clone_into(&mut self.text);
        self.dirty = !same_as_note;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Switching notes is only allowed without unsaved edits.
    pub fn navigation_allowed(&self) -> bool {
        !self.dirty
    }

    pub fn note(&self) -> Option<&Note> {
        self.note.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attachments the loaded note references; empty without a note.
    pub fn referenced_attachments(&self) -> AttachmentFingerprint {
        self.note
            .as_ref()
            .map(|n| n.attachment_hashes().clone())
            .unwrap_or_default()
    }
}

/// Equal up to line separators.
fn same_content(a: &str, b: &str) -> bool {
    a == b || normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, content: &str) -> Note {
        Note::new(id, "title", content)
    }

    fn enabled() -> EditingSession {
        let mut session = EditingSession::new();
        session.set_enabled(true);
        session
    }

    #[test]
    fn test_clean_session_replaces_text() {
        let mut session = enabled();
        let change = session.set_note(Some(note("n1", "hello")));
        assert_eq!(change, NoteChange::Replace("hello".into()));
        assert_eq!(session.text(), "hello");
        assert!(!session.is_dirty());

        assert_eq!(session.set_note(None), NoteChange::Replace(String::new()));
        assert!(session.note().is_none());
    }

    #[test]
    fn test_edit_makes_dirty() {
        let mut session = enabled();
        session.set_note(Some(note("n1", "hello")));

        session.set_text("hello!").unwrap();
        assert!(session.is_dirty());
        assert!(!session.navigation_allowed());

        session.set_text("hello").unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_switch_refused_while_dirty() {
        let mut session = enabled();
        session.set_note(Some(note("n1", "hello")));
        session.set_text("edited").unwrap();

        assert_eq!(session.set_note(Some(note("n2", "other"))), NoteChange::Refused);
        assert_eq!(session.note().map(|n| n.id.as_str()), Some("n1"));
        assert_eq!(session.text(), "edited");
    }

    #[test]
    fn test_saved_note_syncs_session() {
        let mut session = enabled();
        session.set_note(Some(note("n1", "hello")));
        session.set_text("edited").unwrap();

        assert_eq!(session.set_note(Some(note("n1", "edited"))), NoteChange::Synced);
        assert!(!session.is_dirty());
        assert_eq!(session.text(), "edited");
    }

    #[test]
    fn test_same_note_update_keeps_edits() {
        let mut session = enabled();
        session.set_note(Some(note("n1", "hello")));
        session.set_text("edited").unwrap();

        assert_eq!(session.set_note(Some(note("n1", "other"))), NoteChange::Kept);
        assert!(session.is_dirty());
        assert_eq!(session.text(), "edited");
    }

    #[test]
    fn test_disabled_session_rejects_edits() {
        let mut session = EditingSession::new();
        session.set_note(Some(note("n1", "hello")));

        assert_eq!(session.set_text("changed"), Err(SessionError::EditingDisabled));
        assert!(session.set_text("hello").is_ok());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_mixed_separators_stay_clean() {
        let mut session = enabled();
        session.set_note(Some(note("n1", "a\r\nb\nc")));

        session.set_text("a\r\nb\r\nc").unwrap();
        assert!(!session.is_dirty());

        session.set_text("a\r\nb\r\nd").unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.set_note(Some(note("n1", "a\nb\nd"))), NoteChange::Synced);
    }

    #[test]
    fn test_referenced_attachments() {
        let mut session = enabled();
        assert!(session.referenced_attachments().is_empty());

        session.set_note(Some(note("n1", "x").with_attachment("a.png", b"png".to_vec())));
        assert_eq!(session.referenced_attachments().len(), 1);
    }
}
