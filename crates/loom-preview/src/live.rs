//! Live editor: an editing surface wired to a gated preview.
//!
//! [`LiveEditor`] owns the parse pipeline, the editing session, attachment
//! storage and the preview pane, and keeps them in step:
//!
//! - text edits run through the pipeline, which triggers the pane's render
//!   channel
//! - loading a note updates the referenced fingerprint, writes attachments and
//!   feeds the persisted fingerprint back to the gate
//! - viewport changes go to the pane's scroll channel
//!
//! Closing (or dropping) the editor detaches the pane. Nothing reaches the sink
//! afterwards, even if flushes are still queued.

use std::rc::Rc;

use loom_editor_core::smart_edit::{self, SmartEdit};
use loom_editor_core::text::char_len;
use loom_editor_core::{
    DocumentReader, DocumentState, EditingSession, EditorOptions, FindError, FindQuery, Note,
    NoteChange, ParseAndHighlightPipeline, Scheduler, Selection, SessionError,
};

use crate::pane::PreviewPane;
use crate::render::{HtmlRenderer, MarkupRenderer};
use crate::sink::PreviewSink;
use crate::storage::AttachmentStorage;

/// Editing surface plus preview, with explicit teardown.
pub struct LiveEditor {
    options: EditorOptions,
    pipeline: ParseAndHighlightPipeline,
    session: EditingSession,
    storage: AttachmentStorage,
    pane: Option<PreviewPane>,
    selection: Selection,
}

impl LiveEditor {
    /// Editor rendering HTML into `sink`.
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        options: EditorOptions,
        storage: AttachmentStorage,
        sink: impl PreviewSink + 'static,
    ) -> Self {
        Self::with_renderer(scheduler, options, storage, HtmlRenderer::default(), sink)
    }

    pub fn with_renderer(
        scheduler: Rc<dyn Scheduler>,
        options: EditorOptions,
        storage: AttachmentStorage,
        renderer: impl MarkupRenderer + 'static,
        sink: impl PreviewSink + 'static,
    ) -> Self {
        let options = options.normalized();
        let mut pipeline = ParseAndHighlightPipeline::from_options(&options);
        let pane = PreviewPane::new(
            scheduler,
            pipeline.reader(),
            renderer,
            sink,
            storage.base_path(),
        );
        pipeline.subscribe(pane.render_coalescer());

        let mut session = EditingSession::new();
        session.set_enabled(true);

        Self {
            options,
            pipeline,
            session,
            storage,
            pane: Some(pane),
            selection: Selection::default(),
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn set_editing_enabled(&mut self, enabled: bool) {
        self.session.set_enabled(enabled);
    }

    pub fn storage(&self) -> &AttachmentStorage {
        &self.storage
    }

    /// Current published document.
    pub fn document(&self) -> Rc<DocumentState> {
        self.pipeline.current()
    }

    pub fn reader(&self) -> DocumentReader {
        self.pipeline.reader()
    }

    /// The text as it would be written back, with its original separators.
    pub fn materialize(&self) -> String {
        self.pipeline.current().materialize()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let len = char_len(self.pipeline.current().text());
        self.selection = selection.clamped(len);
    }

    pub fn is_open(&self) -> bool {
        self.pane.is_some()
    }

    pub fn pane(&self) -> Option<&PreviewPane> {
        self.pane.as_ref()
    }

    /// Load a note, or clear the editor with `None`.
    ///
    /// A different note is refused while there are unsaved edits.
    pub fn load_note(&mut self, note: Option<Note>) -> NoteChange {
        let change = self.session.set_note(note);
        if change == NoteChange::Refused {
            return change;
        }
        if let NoteChange::Replace(text) = &change {
            self.load_text(text);
        }

        if let Some(pane) = &self.pane {
            pane.set_referenced(self.session.referenced_attachments());
        }
        match self.storage.note_changed(self.session.note()) {
            Ok(Some(persisted)) => {
                if let Some(pane) = &self.pane {
                    pane.set_persisted(persisted);
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(target: "loom::storage", error = %err, "failed to store attachments");
            }
        }
        change
    }

    /// Replace the text programmatically.
    ///
    /// The selection is clamped to the new text and the scroll position is
    /// restored on the next tick.
    pub fn load_text(&mut self, raw: &str) -> Rc<DocumentState> {
        let remembered = self.pane.as_ref().map(PreviewPane::scroll_fraction);
        let state = self.pipeline.load_text(raw);
        self.selection = self.selection.clamped(char_len(state.text()));

        if let (Some(pane), Some(fraction)) = (&self.pane, remembered) {
            if let Err(err) = pane.restore_scroll(fraction) {
                tracing::error!(target: "loom::scroll", error = %err, "could not restore scroll position");
            }
        }
        state
    }

    /// Handle an edit from the editing surface. `text` is LF-normalized.
    pub fn on_text_changed(&mut self, text: &str) -> Result<Rc<DocumentState>, SessionError> {
        let separator = self.pipeline.current().line_separator();
        self.session
            .set_text(&loom_editor_core::materialize(text, separator))?;
        let state = self.pipeline.on_text_changed(text);
        self.selection = self.selection.clamped(char_len(state.text()));
        Ok(state)
    }

    /// Forward editor viewport geometry to the preview.
    pub fn on_viewport_changed(&mut self, offset: f64, total_extent: f64, viewport_extent: f64) -> f64 {
        match &self.pane {
            Some(pane) => pane.on_viewport_changed(offset, total_extent, viewport_extent),
            None => loom_editor_core::scroll_fraction(offset, total_extent, viewport_extent),
        }
    }

    /// Replace the selection with an image referencing attachment `name`.
    pub fn insert_attachment_reference(
        &mut self,
        alt: &str,
        name: &str,
    ) -> Result<Rc<DocumentState>, SessionError> {
        let current = self.pipeline.current();
        let edit = smart_edit::insert_image(current.text(), self.selection, alt, name);
        self.apply(edit)
    }

    pub fn toggle_emphasis(&mut self) -> Result<Rc<DocumentState>, SessionError> {
        let current = self.pipeline.current();
        let markers = self.pipeline.highlighter().markers();
        let edit = smart_edit::toggle_emphasis(current.text(), self.selection, markers);
        self.apply(edit)
    }

    pub fn toggle_strong(&mut self) -> Result<Rc<DocumentState>, SessionError> {
        let current = self.pipeline.current();
        let markers = self.pipeline.highlighter().markers();
        let edit = smart_edit::toggle_strong(current.text(), self.selection, markers);
        self.apply(edit)
    }

    /// Start a bulleted list item at the selection.
    pub fn insert_list_item(&mut self) -> Result<Rc<DocumentState>, SessionError> {
        let current = self.pipeline.current();
        let markers = self.pipeline.highlighter().markers();
        let edit = smart_edit::insert_list_item(current.text(), self.selection, markers);
        self.apply(edit)
    }

    fn apply(&mut self, edit: SmartEdit) -> Result<Rc<DocumentState>, SessionError> {
        let state = self.on_text_changed(&edit.text)?;
        self.set_selection(edit.selection);
        Ok(state)
    }

    pub fn set_find_query(&mut self, query: FindQuery) -> Result<Option<std::ops::Range<usize>>, FindError> {
        self.pipeline.set_find_query(query)
    }

    pub fn find_next(&mut self) -> Option<std::ops::Range<usize>> {
        self.pipeline.find_next()
    }

    pub fn find_previous(&mut self) -> Option<std::ops::Range<usize>> {
        self.pipeline.find_previous()
    }

    pub fn clear_find(&mut self) {
        self.pipeline.clear_find();
    }

    /// Tear down the preview side. Idempotent.
    pub fn close(&mut self) {
        self.pipeline.unsubscribe_all();
        if let Some(pane) = self.pane.take() {
            pane.detach();
            tracing::debug!(target: "loom::preview", "live editor closed");
        }
    }
}

impl Drop for LiveEditor {
    fn drop(&mut self) {
        self.close();
    }
}
