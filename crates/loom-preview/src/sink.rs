//! The preview surface contract.
//!
//! Implementations are provided by the host (a web view, a terminal pager, a
//! file writer). The pane guarantees:
//! - `update` is called at most once per coalescing cycle, and only while the
//!   attachments the markup references are persisted
//! - `scroll_to` is called at most once per coalescing cycle with a fraction
//!   in `[0, 1]`
//! - neither is called after the pane is detached

use std::path::PathBuf;
use std::rc::Rc;

use loom_editor_core::Ast;

use crate::render::Markup;

/// Everything a preview needs to show one document state.
#[derive(Debug, Clone)]
pub struct PreviewContext {
    pub ast: Rc<Ast>,
    pub markup: Markup,
    /// Directory relative resource references resolve against.
    pub base_path: PathBuf,
}

/// Receives gated, coalesced preview updates.
pub trait PreviewSink {
    /// Show new content.
    fn update(&mut self, context: &PreviewContext);

    /// Scroll to `fraction` of the document.
    fn scroll_to(&mut self, fraction: f64);
}

/// Unit type implementation - discards everything.
impl PreviewSink for () {
    fn update(&mut self, _context: &PreviewContext) {}

    fn scroll_to(&mut self, _fraction: f64) {}
}

impl<T: PreviewSink + ?Sized> PreviewSink for Box<T> {
    fn update(&mut self, context: &PreviewContext) {
        (**self).update(context)
    }

    fn scroll_to(&mut self, fraction: f64) {
        (**self).scroll_to(fraction)
    }
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    Update { markup: Markup, base_path: PathBuf },
    Scroll(f64),
}

/// Sink that records every call, shareable with whoever inspects it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<std::cell::RefCell<Vec<PreviewEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PreviewEvent> {
        self.events.borrow().clone()
    }

    /// Markup of the most recent update.
    pub fn last_markup(&self) -> Option<Markup> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            PreviewEvent::Update { markup, .. } => Some(markup.clone()),
            PreviewEvent::Scroll(_) => None,
        })
    }

    pub fn update_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, PreviewEvent::Update { .. }))
            .count()
    }

    pub fn scrolls(&self) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PreviewEvent::Scroll(f) => Some(*f),
                PreviewEvent::Update { .. } => None,
            })
            .collect()
    }
}

impl PreviewSink for RecordingSink {
    fn update(&mut self, context: &PreviewContext) {
        self.events.borrow_mut().push(PreviewEvent::Update {
            markup: context.markup.clone(),
            base_path: context.base_path.clone(),
        });
    }

    fn scroll_to(&mut self, fraction: f64) {
        self.events.borrow_mut().push(PreviewEvent::Scroll(fraction));
    }
}
