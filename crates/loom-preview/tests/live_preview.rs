// End-to-end: note loading, attachment persistence, gating and coalesced
// delivery to a preview sink.

use std::rc::Rc;

use loom_editor_core::{
    AttachmentFingerprint, EditorOptions, LineSeparator, LocalScheduler, Note, NoteChange,
};
use loom_preview::{AttachmentStorage, LiveEditor, RecordingSink, StorageState};

struct Harness {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
    scheduler: LocalScheduler,
    editor: LiveEditor,
    sink: RecordingSink,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("attachments");
    let scheduler = LocalScheduler::new();
    let sink = RecordingSink::new();
    let editor = LiveEditor::new(
        Rc::new(scheduler.clone()),
        EditorOptions::default(),
        AttachmentStorage::new(&root, StorageState::default()),
        sink.clone(),
    );
    Harness {
        _dir: dir,
        root,
        scheduler,
        editor,
        sink,
    }
}

#[test]
fn test_crlf_note_edit_and_serialize() {
    let mut h = harness();
    h.editor.load_note(Some(Note::new("n1", "title", "a\r\nb")));
    assert_eq!(h.editor.document().line_separator(), LineSeparator::Crlf);
    assert_eq!(h.editor.document().text(), "a\nb");

    h.editor.on_text_changed("a\nb\nc").unwrap();
    assert_eq!(h.editor.materialize(), "a\r\nb\r\nc");

    // No attachments: the gate never closed, the first markup goes straight out.
    h.scheduler.run_until_idle(10);
    assert_eq!(h.sink.update_count(), 1);
    assert_eq!(
        h.sink.last_markup().unwrap().as_str(),
        "<p>a\nb\nc</p>\n"
    );
}

#[test]
fn test_typing_burst_yields_one_update() {
    let mut h = harness();
    h.editor.load_note(Some(Note::new("n1", "title", "")));
    h.scheduler.run_until_idle(10);
    let before = h.sink.update_count();

    for text in ["h", "he", "hel", "hell", "hello"] {
        h.editor.on_text_changed(text).unwrap();
    }
    h.scheduler.run_until_idle(10);

    assert_eq!(h.sink.update_count(), before + 1);
    assert_eq!(h.sink.last_markup().unwrap().as_str(), "<p>hello</p>\n");
}

#[test]
fn test_changed_attachment_is_written_then_shown() {
    let mut h = harness();
    let note = Note::new("n1", "title", "![pic](attachment:pic.png)")
        .with_attachment("pic.png", b"v1".to_vec());
    h.editor.load_note(Some(note.clone()));
    h.scheduler.run_until_idle(10);
    assert_eq!(std::fs::read(h.root.join("pic.png")).unwrap(), b"v1");
    assert_eq!(h.sink.update_count(), 1);

    // Same note, new attachment bytes: the session is clean, so it reloads.
    let updated = note.with_attachment("pic.png", b"v2".to_vec());
    let change = h.editor.load_note(Some(updated));
    assert!(matches!(change, NoteChange::Replace(_)));
    h.scheduler.run_until_idle(10);

    assert_eq!(std::fs::read(h.root.join("pic.png")).unwrap(), b"v2");
    assert!(h.editor.pane().unwrap().is_gate_open());
}

#[test]
fn test_gate_closes_until_storage_catches_up() {
    let mut h = harness();
    h.editor.load_note(Some(Note::new("n1", "title", "text")));
    h.scheduler.run_until_idle(10);
    let pane = h.editor.pane().unwrap();
    let shown = h.sink.update_count();

    let mut referenced = AttachmentFingerprint::new();
    referenced.insert("late.png", "h1");
    pane.set_referenced(referenced.clone());
    assert!(!pane.is_gate_open());

    h.editor.on_text_changed("text ![x](attachment:late.png)").unwrap();
    h.scheduler.run_until_idle(10);
    assert_eq!(h.sink.update_count(), shown);

    h.editor.pane().unwrap().set_persisted(referenced);
    h.scheduler.run_until_idle(10);
    assert_eq!(h.sink.update_count(), shown + 1);
    assert!(h.sink.last_markup().unwrap().as_str().contains("late.png"));
}

#[test]
fn test_scroll_burst_delivers_final_fraction() {
    let mut h = harness();
    h.editor.load_text("content");
    h.scheduler.run_until_idle(10);

    for offset in [0.0, 120.0, 240.0, 300.0] {
        h.editor.on_viewport_changed(offset, 400.0, 100.0);
    }
    h.scheduler.run_until_idle(10);

    let scrolls = h.sink.scrolls();
    assert!((scrolls.last().copied().unwrap() - 1.0).abs() < 1e-9);
    // Only the restore after loading and the final position were delivered.
    assert_eq!(scrolls.len(), 2);
    assert_eq!(scrolls[0], 0.0);
}

#[test]
fn test_drop_editor_silences_sink() {
    let mut h = harness();
    h.editor.load_text("content");
    h.editor.on_viewport_changed(10.0, 400.0, 100.0);
    drop(h.editor);
    h.scheduler.run_until_idle(10);

    assert!(h.sink.events().is_empty());
}
