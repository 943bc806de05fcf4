//! Preview pane: render and scroll channels feeding one sink.
//!
//! The pane owns two coalescers. The render channel is triggered whenever the
//! document is republished or the attachment gate changes; its flush renders
//! the latest text once, passes it through the gate and updates the sink. The
//! scroll channel forwards the latest scroll fraction.
//!
//! Scheduled flushes only hold weak references, so once the pane is detached
//! or dropped they do nothing.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use loom_editor_core::{
    AttachmentFingerprint, DocumentReader, Scheduler, SchedulerError, ScrollSynchronizer,
    UpdateCoalescer, WeakCoalescer,
};

use crate::gate::AttachmentGate;
use crate::render::{Markup, MarkupRenderer};
use crate::sink::{PreviewContext, PreviewSink};

struct PaneShared {
    reader: DocumentReader,
    renderer: Box<dyn MarkupRenderer>,
    base_path: RefCell<PathBuf>,
    gate: RefCell<AttachmentGate>,
    /// Markup released by the gate and not yet delivered.
    released: RefCell<Option<Markup>>,
    /// Text the last markup was rendered from.
    rendered_text: RefCell<Option<Rc<str>>>,
    sink: RefCell<Option<Box<dyn PreviewSink>>>,
    channels: RefCell<Vec<WeakCoalescer>>,
    halted: Cell<bool>,
}

/// Gated, coalesced preview of a published document.
pub struct PreviewPane {
    shared: Rc<PaneShared>,
    render: UpdateCoalescer,
    scroll: ScrollSynchronizer,
}

impl PreviewPane {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        reader: DocumentReader,
        renderer: impl MarkupRenderer + 'static,
        sink: impl PreviewSink + 'static,
        base_path: impl Into<PathBuf>,
    ) -> Self {
        let shared = Rc::new(PaneShared {
            reader,
            renderer: Box::new(renderer),
            base_path: RefCell::new(base_path.into()),
            gate: RefCell::new(AttachmentGate::new()),
            released: RefCell::new(None),
            rendered_text: RefCell::new(None),
            sink: RefCell::new(Some(Box::new(sink))),
            channels: RefCell::new(Vec::new()),
            halted: Cell::new(false),
        });

        let weak = Rc::downgrade(&shared);
        let render = UpdateCoalescer::new("render", scheduler.clone(), move || {
            if let Some(shared) = weak.upgrade() {
                shared.flush_render();
            }
        });

        let weak: Weak<PaneShared> = Rc::downgrade(&shared);
        let scroll = ScrollSynchronizer::new(scheduler, move |fraction| {
            if let Some(shared) = weak.upgrade() {
                shared.flush_scroll(fraction);
            }
        });

        shared
            .channels
            .borrow_mut()
            .extend([render.downgrade(), scroll.coalescer().downgrade()]);

        Self {
            shared,
            render,
            scroll,
        }
    }

    /// Coalescer to subscribe to document publications.
    pub fn render_coalescer(&self) -> &UpdateCoalescer {
        &self.render
    }

    /// Request a render pass on the next tick.
    pub fn request_render(&self) {
        self.render.trigger();
    }

    /// The document now references `fingerprint`.
    pub fn set_referenced(&self, fingerprint: AttachmentFingerprint) {
        let released = self.shared.gate.borrow_mut().set_referenced(fingerprint);
        self.release(released);
    }

    /// Storage reports `fingerprint` as persisted.
    pub fn set_persisted(&self, fingerprint: AttachmentFingerprint) {
        let released = self.shared.gate.borrow_mut().set_persisted(fingerprint);
        self.release(released);
    }

    fn release(&self, markup: Option<Markup>) {
        match markup {
            Some(markup) => {
                *self.shared.released.borrow_mut() = Some(markup);
                self.render.trigger();
            }
            // Closed again: anything released earlier is stale. The gate still
            // holds the latest markup for when it reopens.
            None if !self.is_gate_open() => {
                if self.shared.released.borrow_mut().take().is_some() {
                    tracing::debug!(target: "loom::preview", "gate closed, released markup withdrawn");
                }
            }
            None => {}
        }
    }

    pub fn is_gate_open(&self) -> bool {
        self.shared.gate.borrow().is_open()
    }

    pub fn set_base_path(&self, base_path: impl Into<PathBuf>) {
        *self.shared.base_path.borrow_mut() = base_path.into();
    }

    pub fn base_path(&self) -> PathBuf {
        self.shared.base_path.borrow().clone()
    }

    /// Report editor viewport geometry. Returns the new scroll fraction.
    pub fn on_viewport_changed(&self, offset: f64, total_extent: f64, viewport_extent: f64) -> f64 {
        self.scroll.on_viewport_changed(offset, total_extent, viewport_extent)
    }

    pub fn scroll_fraction(&self) -> f64 {
        self.scroll.fraction()
    }

    /// Scroll back to `fraction` on the next tick.
    pub fn restore_scroll(&self, fraction: f64) -> Result<(), SchedulerError> {
        self.scroll.restore_fraction(fraction)
    }

    /// Whether a channel lost its scheduler and the pane stopped.
    pub fn is_terminated(&self) -> bool {
        self.shared.is_halted()
    }

    pub fn is_attached(&self) -> bool {
        self.shared.sink.borrow().is_some()
    }

    /// Drop the sink. Flushes still in the queue find nothing to update.
    pub fn detach(&self) {
        if self.shared.sink.borrow_mut().take().is_some() {
            tracing::debug!(target: "loom::preview", "preview pane detached");
        }
    }
}

impl PaneShared {
    fn is_halted(&self) -> bool {
        if self.halted.get() {
            return true;
        }
        let failed = self
            .channels
            .borrow()
            .iter()
            .filter_map(WeakCoalescer::upgrade)
            .find(UpdateCoalescer::is_terminated);
        if let Some(channel) = failed {
            tracing::error!(
                target: "loom::preview",
                channel = channel.channel(),
                "preview channel terminated, pane stopped"
            );
            self.halted.set(true);
            self.sink.borrow_mut().take();
        }
        self.halted.get()
    }

    fn flush_render(&self) {
        if self.is_halted() || self.sink.borrow().is_none() {
            return;
        }

        let document = self.reader.snapshot();
        let text = document.shared_text();
        let stale = self
            .rendered_text
            .borrow()
            .as_ref()
            .is_none_or(|rendered| !Rc::ptr_eq(rendered, &text));
        if stale {
            let markup = self.renderer.render(&text);
            *self.rendered_text.borrow_mut() = Some(text);
            if let Some(released) = self.gate.borrow_mut().offer_markup(markup) {
                *self.released.borrow_mut() = Some(released);
            }
        }

        let Some(markup) = self.released.borrow_mut().take() else {
            tracing::trace!(target: "loom::preview", "nothing released, skipping update");
            return;
        };
        if !self.gate.borrow().is_open() {
            tracing::debug!(target: "loom::preview", "gate closed, update held back");
            return;
        }
        let context = PreviewContext {
            ast: document.ast().clone(),
            markup,
            base_path: self.base_path.borrow().clone(),
        };
        tracing::debug!(target: "loom::preview", revision = document.revision(), "preview update");
        if let Some(sink) = self.sink.borrow_mut().as_mut() {
            sink.update(&context);
        }
    }

    fn flush_scroll(&self, fraction: f64) {
        if self.is_halted() {
            return;
        }
        if let Some(sink) = self.sink.borrow_mut().as_mut() {
            sink.scroll_to(fraction);
        }
    }
}

impl Drop for PreviewPane {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for PreviewPane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewPane")
            .field("base_path", &self.shared.base_path.borrow())
            .field("gate_open", &self.is_gate_open())
            .field("attached", &self.is_attached())
            .field("render", &self.render)
            .field("scroll", &self.scroll)
            .finish()
    }
}
