//! Coalescing of "please recompute" signals.
//!
//! Editing produces a firehose of change notifications, but the preview only
//! needs to see the state as of the end of the current event. An
//! [`UpdateCoalescer`] turns any number of [`trigger`](UpdateCoalescer::trigger)
//! calls made before the next scheduler tick into a single flush.
//!
//! Triggers are dropped, not queued, while a flush is pending: the flush reads
//! the latest state when it runs, so queuing would only repeat the same work.
//! The pending flag is cleared *before* the flush callback runs, so a trigger
//! raised from inside the callback schedules a fresh follow-up flush.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::SchedulerError;
use crate::scheduler::Scheduler;

/// Collapses repeated triggers into one scheduled flush per cycle.
///
/// Clones share state. Each logical channel (render, scroll) gets its own
/// instance; triggers on one never touch another.
#[derive(Clone)]
pub struct UpdateCoalescer {
    inner: Rc<CoalescerInner>,
}

/// Non-owning handle to a coalescer, for use inside flush callbacks.
#[derive(Clone)]
pub struct WeakCoalescer {
    inner: Weak<CoalescerInner>,
}

struct CoalescerInner {
    channel: &'static str,
    scheduler: Rc<dyn Scheduler>,
    pending: Cell<bool>,
    failure: RefCell<Option<SchedulerError>>,
    flush: RefCell<Box<dyn FnMut()>>,
    flushes: Cell<u64>,
}

impl UpdateCoalescer {
    /// Create a coalescer for `channel` that runs `flush` on `scheduler`.
    pub fn new(
        channel: &'static str,
        scheduler: Rc<dyn Scheduler>,
        flush: impl FnMut() + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(CoalescerInner {
                channel,
                scheduler,
                pending: Cell::new(false),
                failure: RefCell::new(None),
                flush: RefCell::new(Box::new(flush)),
                flushes: Cell::new(0),
            }),
        }
    }

    /// Record that a flush is wanted.
    ///
    /// No-op while a flush is already pending or after the scheduler failed.
    pub fn trigger(&self) {
        CoalescerInner::trigger(&self.inner);
    }

    /// Whether a flush has been scheduled but not yet executed.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get()
    }

    /// Whether the scheduler refused work and this coalescer stopped.
    pub fn is_terminated(&self) -> bool {
        self.inner.failure.borrow().is_some()
    }

    /// The scheduler failure that stopped this coalescer, if any.
    pub fn failure(&self) -> Option<SchedulerError> {
        self.inner.failure.borrow().clone()
    }

    /// Number of flushes executed so far.
    pub fn flush_count(&self) -> u64 {
        self.inner.flushes.get()
    }

    /// Channel name, used in logs.
    pub fn channel(&self) -> &'static str {
        self.inner.channel
    }

    /// Get a handle that does not keep the coalescer alive.
    pub fn downgrade(&self) -> WeakCoalescer {
        WeakCoalescer {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl WeakCoalescer {
    /// Trigger the coalescer if it still exists.
    pub fn trigger(&self) {
        if let Some(inner) = self.inner.upgrade() {
            CoalescerInner::trigger(&inner);
        }
    }

    /// Get a strong handle if the coalescer still exists.
    pub fn upgrade(&self) -> Option<UpdateCoalescer> {
        self.inner.upgrade().map(|inner| UpdateCoalescer { inner })
    }
}

impl CoalescerInner {
    fn trigger(this: &Rc<Self>) {
        if this.failure.borrow().is_some() {
            return;
        }
        if this.pending.get() {
            tracing::trace!(target: "loom::coalesce", channel = this.channel, "trigger dropped, flush pending");
            return;
        }

        // The task only holds a weak reference: once the owner is torn down a
        // scheduled flush finds nothing to do.
        let task = FlushTask {
            inner: Rc::downgrade(this),
            armed: true,
        };
        match this.scheduler.schedule(Box::new(move || task.run())) {
            // Set after scheduling so a task rejected (and dropped) by the
            // scheduler is not mistaken for a discarded one.
            Ok(()) => this.pending.set(true),
            Err(err) => this.terminate(err),
        }
    }

    fn terminate(&self, err: SchedulerError) {
        self.pending.set(false);
        if self.failure.borrow().is_some() {
            return;
        }
        tracing::error!(
            target: "loom::coalesce",
            channel = self.channel,
            error = %err,
            "scheduler refused flush, coalescer terminated"
        );
        *self.failure.borrow_mut() = Some(err);
    }

    fn run_flush(&self) {
        // Clear first so triggers raised by the flush itself schedule a new one.
        self.pending.set(false);
        self.flushes.set(self.flushes.get() + 1);
        tracing::trace!(target: "loom::coalesce", channel = self.channel, "flush");
        let mut flush = self.flush.borrow_mut();
        (flush)();
    }
}

/// Scheduled flush. Dropped unrun while its flush is pending, it terminates
/// the coalescer instead of leaving it waiting forever.
struct FlushTask {
    inner: Weak<CoalescerInner>,
    armed: bool,
}

impl FlushTask {
    fn run(mut self) {
        self.armed = false;
        if let Some(inner) = self.inner.upgrade() {
            inner.run_flush();
        }
    }
}

impl Drop for FlushTask {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            if inner.pending.get() {
                inner.terminate(SchedulerError::Dropped);
            }
        }
    }
}

impl std::fmt::Debug for UpdateCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCoalescer")
            .field("channel", &self.inner.channel)
            .field("pending", &self.inner.pending.get())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::LocalScheduler;

    fn counting(scheduler: &LocalScheduler) -> (UpdateCoalescer, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let coalescer = UpdateCoalescer::new("test", Rc::new(scheduler.clone()), move || {
            c.set(c.get() + 1)
        });
        (coalescer, count)
    }

    #[test]
    fn test_many_triggers_one_flush() {
        let scheduler = LocalScheduler::new();
        let (coalescer, count) = counting(&scheduler);

        for _ in 0..50 {
            coalescer.trigger();
        }
        assert!(coalescer.is_pending());
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_tick();
        assert_eq!(count.get(), 1);
        assert!(!coalescer.is_pending());
    }

    #[test]
    fn test_flush_observes_last_state() {
        let scheduler = LocalScheduler::new();
        let state = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (s, v) = (state.clone(), seen.clone());
        let coalescer =
            UpdateCoalescer::new("test", Rc::new(scheduler.clone()), move || {
                v.borrow_mut().push(s.get())
            });

        for value in 1..=5 {
            state.set(value);
            coalescer.trigger();
        }
        scheduler.run_until_idle(10);

        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn test_trigger_inside_flush_schedules_one_more() {
        let scheduler = LocalScheduler::new();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<WeakCoalescer>>> = Rc::new(RefCell::new(None));

        let (c, s) = (count.clone(), slot.clone());
        let coalescer = UpdateCoalescer::new("test", Rc::new(scheduler.clone()), move || {
            c.set(c.get() + 1);
            if c.get() == 1 {
                if let Some(me) = s.borrow().as_ref() {
                    me.trigger();
                    me.trigger();
                }
            }
        });
        *slot.borrow_mut() = Some(coalescer.downgrade());

        coalescer.trigger();
        scheduler.run_tick();
        assert_eq!(count.get(), 1);
        assert!(coalescer.is_pending());
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_tick();
        assert_eq!(count.get(), 2);
        assert_eq!(scheduler.run_tick(), 0);
    }

    #[test]
    fn test_channels_are_independent() {
        let scheduler = LocalScheduler::new();
        let (render, render_count) = counting(&scheduler);
        let (scroll, scroll_count) = counting(&scheduler);

        render.trigger();
        render.trigger();
        scheduler.run_tick();

        assert_eq!(render_count.get(), 1);
        assert_eq!(scroll_count.get(), 0);
        assert!(!scroll.is_pending());
    }

    #[test]
    fn test_closed_scheduler_terminates() {
        let scheduler = LocalScheduler::new();
        let (coalescer, count) = counting(&scheduler);
        scheduler.close();

        coalescer.trigger();
        assert!(coalescer.is_terminated());
        assert_eq!(coalescer.failure(), Some(SchedulerError::Closed));
        assert!(!coalescer.is_pending());

        coalescer.trigger();
        scheduler.run_tick();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_close_with_flush_queued_terminates() {
        let scheduler = LocalScheduler::new();
        let (coalescer, count) = counting(&scheduler);

        coalescer.trigger();
        assert!(coalescer.is_pending());
        scheduler.close();

        assert!(!coalescer.is_pending());
        assert_eq!(coalescer.failure(), Some(SchedulerError::Dropped));

        coalescer.trigger();
        assert_eq!(coalescer.failure(), Some(SchedulerError::Dropped));
        assert_eq!(scheduler.run_tick(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_dropped_coalescer_skips_flush() {
        let scheduler = LocalScheduler::new();
        let (coalescer, count) = counting(&scheduler);

        coalescer.trigger();
        drop(coalescer);
        assert_eq!(scheduler.run_tick(), 1);
        assert_eq!(count.get(), 0);
    }
}
