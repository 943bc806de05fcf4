//! Parse and highlight pipeline.
//!
//! Every text change is parsed, highlighted from the fresh tree, composed with
//! the active overlay and published as a new [`DocumentState`]. Subscribed
//! coalescers are then triggered, so downstream consumers do at most one pass
//! per scheduler tick however many edits arrive.
//!
//! Text and overlay are independent inputs to the same output: changing the
//! find state re-derives the spans from the current tree without reparsing.

use std::ops::Range;
use std::rc::Rc;

use crate::ast::{CmarkParser, MarkdownParser};
use crate::coalesce::{UpdateCoalescer, WeakCoalescer};
use crate::document::{DocumentPublisher, DocumentReader, DocumentState};
use crate::error::FindError;
use crate::find::{FindQuery, FindState};
use crate::highlight::Highlighter;
use crate::options::EditorOptions;
use crate::separator;
use crate::syntax::StyleSpans;
use crate::types::LineSeparator;

/// Owns the document state and derives it from text and overlay inputs.
pub struct ParseAndHighlightPipeline<P = CmarkParser> {
    parser: P,
    highlighter: Highlighter,
    publisher: DocumentPublisher,
    find: Option<FindState>,
    line_separator_default: LineSeparator,
    subscribers: Vec<WeakCoalescer>,
}

impl ParseAndHighlightPipeline<CmarkParser> {
    /// Pipeline with the default CommonMark parser.
    pub fn from_options(options: &EditorOptions) -> Self {
        Self::new(
            CmarkParser::default(),
            Highlighter::from_options(options),
            options.line_separator_default,
        )
    }
}

impl<P: MarkdownParser> ParseAndHighlightPipeline<P> {
    pub fn new(parser: P, highlighter: Highlighter, line_separator_default: LineSeparator) -> Self {
        Self {
            parser,
            highlighter,
            publisher: DocumentPublisher::new(DocumentState::empty(line_separator_default)),
            find: None,
            line_separator_default,
            subscribers: Vec::new(),
        }
    }

    /// Read-only handle to the published state.
    pub fn reader(&self) -> DocumentReader {
        self.publisher.reader()
    }

    pub fn current(&self) -> Rc<DocumentState> {
        self.publisher.current()
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Trigger `coalescer` after every publish.
    ///
    /// Only a weak handle is kept; dropping the coalescer unsubscribes it.
    pub fn subscribe(&mut self, coalescer: &UpdateCoalescer) {
        self.subscribers.push(coalescer.downgrade());
    }

    /// Drop every subscription.
    pub fn unsubscribe_all(&mut self) {
        self.subscribers.clear();
    }

    /// Replace the text with freshly loaded content.
    ///
    /// Detects the separator style and LF-normalizes before the usual
    /// text-changed processing.
    pub fn load_text(&mut self, raw: &str) -> Rc<DocumentState> {
        let (text, separator) = separator::detect_and_normalize(raw, self.line_separator_default);
        tracing::debug!(target: "loom::pipeline", %separator, len = text.len(), "loading text");
        self.process(Rc::from(text), separator)
    }

    /// Handle a text edit. The separator of the loaded text is kept.
    pub fn on_text_changed(&mut self, new_text: &str) -> Rc<DocumentState> {
        let separator = self.publisher.current().line_separator();
        self.process(Rc::from(separator::normalize(new_text)), separator)
    }

    fn process(&mut self, text: Rc<str>, separator: LineSeparator) -> Rc<DocumentState> {
        let ast = Rc::new(self.parser.parse(&text));
        let base = self.highlighter.base_spans(&ast, &text);

        if let Some(find) = self.find.as_mut() {
            find.text_changed(&text);
        }
        let overlay = self.overlay_spans();

        let revision = self.publisher.current().revision() + 1;
        if tracing::enabled!(target: "loom::pipeline", tracing::Level::TRACE) {
            tracing::trace!(
                target: "loom::pipeline",
                revision,
                nodes = ast.node_count(),
                base = base.len(),
                overlay = overlay.len(),
                "parsed and highlighted"
            );
        }

        let state = DocumentState::new(
            revision,
            text,
            separator,
            ast,
            StyleSpans::new(base, overlay),
        );
        self.publish(state)
    }

    /// Activate a find query against the current text.
    ///
    /// Returns the active hit. An invalid query clears the overlay.
    pub fn set_find_query(&mut self, query: FindQuery) -> Result<Option<Range<usize>>, FindError> {
        let current = self.publisher.current();
        match FindState::new(query, current.text()) {
            Ok(find) => {
                let active = find.active_hit();
                self.find = Some(find);
                self.rehighlight();
                Ok(active)
            }
            Err(err) => {
                self.clear_find();
                Err(err)
            }
        }
    }

    pub fn find_state(&self) -> Option<&FindState> {
        self.find.as_ref()
    }

    pub fn find_next(&mut self) -> Option<Range<usize>> {
        let hit = self.find.as_mut()?.find_next();
        self.rehighlight();
        hit
    }

    pub fn find_previous(&mut self) -> Option<Range<usize>> {
        let hit = self.find.as_mut()?.find_previous();
        self.rehighlight();
        hit
    }

    /// Remove the find overlay.
    pub fn clear_find(&mut self) {
        if self.find.take().is_some() || !self.publisher.current().style_spans().overlay().is_empty() {
            self.rehighlight();
        }
    }

    /// Re-derive spans for the current tree with the current overlay.
    fn rehighlight(&mut self) -> Rc<DocumentState> {
        let current = self.publisher.current();
        let spans = current.style_spans().with_overlay(self.overlay_spans());
        let state = DocumentState::new(
            current.revision() + 1,
            current.shared_text(),
            current.line_separator(),
            current.ast().clone(),
            spans,
        );
        self.publish(state)
    }

    fn overlay_spans(&self) -> Vec<crate::syntax::Span> {
        self.find.as_ref().map(FindState::overlay_spans).unwrap_or_default()
    }

    fn publish(&mut self, state: DocumentState) -> Rc<DocumentState> {
        let state = self.publisher.publish(state);
        self.subscribers.retain(|s| s.upgrade().is_some());
        for subscriber in &self.subscribers {
            subscriber.trigger();
        }
        state
    }
}
