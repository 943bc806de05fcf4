//! Editor to preview scroll synchronization.
//!
//! The editor reports raw viewport geometry; the preview only cares about how
//! far through the document the user is. Scroll events are coalesced like
//! render updates, and the flush reads the fraction at flush time.

use std::cell::Cell;
use std::rc::Rc;

use crate::coalesce::UpdateCoalescer;
use crate::error::SchedulerError;
use crate::scheduler::Scheduler;

/// Map a scroll offset to a fraction in `[0, 1]`.
///
/// Content that fits in the viewport has nowhere to scroll, so it maps to 0.
/// Non-finite input also maps to 0.
pub fn scroll_fraction(offset: f64, total_extent: f64, viewport_extent: f64) -> f64 {
    let scrollable = total_extent - viewport_extent;
    if !(scrollable > 0.0) || !offset.is_finite() {
        return 0.0;
    }
    (offset / scrollable.max(1.0)).clamp(0.0, 1.0)
}

/// Tracks the editor scroll position and forwards it, coalesced.
pub struct ScrollSynchronizer {
    fraction: Rc<Cell<f64>>,
    coalescer: UpdateCoalescer,
    scheduler: Rc<dyn Scheduler>,
}

impl ScrollSynchronizer {
    /// `on_scroll` receives the fraction current at flush time.
    pub fn new(scheduler: Rc<dyn Scheduler>, mut on_scroll: impl FnMut(f64) + 'static) -> Self {
        let fraction = Rc::new(Cell::new(0.0));
        let current = Rc::downgrade(&fraction);
        let coalescer = UpdateCoalescer::new("scroll", scheduler.clone(), move || {
            if let Some(current) = current.upgrade() {
                on_scroll(current.get());
            }
        });
        Self {
            fraction,
            coalescer,
            scheduler,
        }
    }

    /// Record new viewport geometry. Returns the resulting fraction.
    pub fn on_viewport_changed(&self, offset: f64, total_extent: f64, viewport_extent: f64) -> f64 {
        let fraction = scroll_fraction(offset, total_extent, viewport_extent);
        self.set_fraction(fraction);
        fraction
    }

    /// Jump straight to `fraction`, clamped to `[0, 1]`.
    pub fn set_fraction(&self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.fraction.set(fraction);
        self.coalescer.trigger();
    }

    /// Last known fraction.
    pub fn fraction(&self) -> f64 {
        self.fraction.get()
    }

    /// Re-apply `fraction` on the next tick.
    ///
    /// Used after a programmatic text replacement, which resets the surface
    /// to the top before the new layout is known.
    pub fn restore_fraction(&self, fraction: f64) -> Result<(), SchedulerError> {
        let target = Rc::downgrade(&self.fraction);
        let coalescer = self.coalescer.downgrade();
        tracing::debug!(target: "loom::scroll", fraction, "restoring scroll position");
        self.scheduler.schedule(Box::new(move || {
            if let Some(target) = target.upgrade() {
                target.set(fraction.clamp(0.0, 1.0));
                coalescer.trigger();
            }
        }))
    }

    pub fn coalescer(&self) -> &UpdateCoalescer {
        &self.coalescer
    }
}

impl std::fmt::Debug for ScrollSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollSynchronizer")
            .field("fraction", &self.fraction.get())
            .field("pending", &self.coalescer.is_pending())
            .finish()
    }
}
