//! Document state and its single-writer publication.
//!
//! A [`DocumentState`] is an immutable snapshot: text, the parse of that text
//! and the style spans derived from that parse plus the overlay active at the
//! time. Only the pipeline creates snapshots. It publishes them through a
//! [`DocumentPublisher`]; everyone else holds a [`DocumentReader`] and gets
//! cheap shared snapshots.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Ast;
use crate::syntax::StyleSpans;
use crate::types::LineSeparator;

/// One consistent view of the edited document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentState {
    revision: u64,
    text: Rc<str>,
    line_separator: LineSeparator,
    ast: Rc<Ast>,
    style_spans: StyleSpans,
}

impl DocumentState {
    /// The state before any text arrived.
    pub fn empty(line_separator: LineSeparator) -> Self {
        Self {
            revision: 0,
            text: Rc::from(""),
            line_separator,
            ast: Rc::new(Ast::empty()),
            style_spans: StyleSpans::default(),
        }
    }

    pub(crate) fn new(
        revision: u64,
        text: Rc<str>,
        line_separator: LineSeparator,
        ast: Rc<Ast>,
        style_spans: StyleSpans,
    ) -> Self {
        Self {
            revision,
            text,
            line_separator,
            ast,
            style_spans,
        }
    }

    /// Monotonic counter bumped for every published state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// LF-normalized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shared_text(&self) -> Rc<str> {
        self.text.clone()
    }

    /// Separator to use when the text is serialized.
    pub fn line_separator(&self) -> LineSeparator {
        self.line_separator
    }

    /// Parse of [`text`](Self::text).
    pub fn ast(&self) -> &Rc<Ast> {
        &self.ast
    }

    pub fn style_spans(&self) -> &StyleSpans {
        &self.style_spans
    }

    /// The text with its original line separator restored.
    pub fn materialize(&self) -> String {
        crate::separator::materialize(&self.text, self.line_separator)
    }
}

type Slot = Rc<RefCell<Rc<DocumentState>>>;

/// The only handle that can replace the current document state.
#[derive(Debug)]
pub struct DocumentPublisher {
    slot: Slot,
}

/// Read-only access to the latest published state.
#[derive(Debug, Clone)]
pub struct DocumentReader {
    slot: Slot,
}

impl DocumentPublisher {
    pub fn new(initial: DocumentState) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Rc::new(initial))),
        }
    }

    pub fn publish(&self, state: DocumentState) -> Rc<DocumentState> {
        let state = Rc::new(state);
        *self.slot.borrow_mut() = state.clone();
        state
    }

    pub fn current(&self) -> Rc<DocumentState> {
        self.slot.borrow().clone()
    }

    pub fn reader(&self) -> DocumentReader {
        DocumentReader {
            slot: self.slot.clone(),
        }
    }
}

impl DocumentReader {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> Rc<DocumentState> {
        self.slot.borrow().clone()
    }
}
