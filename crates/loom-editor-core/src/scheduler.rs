//! Host event loop abstraction.
//!
//! Everything in the editor runs on one logical UI thread. Instead of blocking,
//! work that has to happen "after the current event" is handed to a
//! [`Scheduler`], which runs it on the next turn of the loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::SchedulerError;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Accepts tasks to run on the next tick of the host's UI cycle.
pub trait Scheduler {
    /// Queue `task` for the next tick.
    ///
    /// Failing here is fatal for whoever relied on the task running.
    fn schedule(&self, task: Task) -> Result<(), SchedulerError>;
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, task: Task) -> Result<(), SchedulerError> {
        (**self).schedule(task)
    }
}

/// Single-threaded task queue driven explicitly by the host.
///
/// Clones share the same queue. A tick runs exactly the tasks that were queued
/// when it started; anything scheduled while it runs waits for the next tick.
#[derive(Clone, Default)]
pub struct LocalScheduler {
    inner: Rc<LocalInner>,
}

#[derive(Default)]
struct LocalInner {
    queue: RefCell<VecDeque<Task>>,
    closed: Cell<bool>,
}

impl LocalScheduler {
    /// Create an empty, open scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick. Returns the number of tasks executed.
    pub fn run_tick(&self) -> usize {
        // Take the batch before running anything so tasks can schedule freely.
        let batch: Vec<Task> = self.inner.queue.borrow_mut().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        if count > 0 {
            tracing::trace!(target: "loom::scheduler", count, "tick");
        }
        count
    }

    /// Run ticks until the queue is empty or `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks that executed at least one task.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.pending() > 0 {
            self.run_tick();
            ticks += 1;
        }
        ticks
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Refuse all further tasks. Already queued tasks are dropped.
    pub fn close(&self) {
        self.inner.closed.set(true);
        self.inner.queue.borrow_mut().clear();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

impl Scheduler for LocalScheduler {
    fn schedule(&self, task: Task) -> Result<(), SchedulerError> {
        if self.inner.closed.get() {
            return Err(SchedulerError::Closed);
        }
        self.inner.queue.borrow_mut().push_back(task);
        Ok(())
    }
}

impl std::fmt::Debug for LocalScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalScheduler")
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_on_tick() {
        let scheduler = LocalScheduler::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        scheduler.schedule(Box::new(move || h.set(h.get() + 1))).unwrap();

        assert_eq!(hits.get(), 0);
        assert_eq!(scheduler.run_tick(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.run_tick(), 0);
    }

    #[test]
    fn test_task_scheduled_during_tick_waits() {
        let scheduler = LocalScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let s = scheduler.clone();
        let o = order.clone();
        scheduler
            .schedule(Box::new(move || {
                o.borrow_mut().push("first");
                let o2 = o.clone();
                s.schedule(Box::new(move || o2.borrow_mut().push("second")))
                    .unwrap();
            }))
            .unwrap();

        scheduler.run_tick();
        assert_eq!(*order.borrow(), vec!["first"]);
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_tick();
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_closed_scheduler_rejects() {
        let scheduler = LocalScheduler::new();
        scheduler.schedule(Box::new(|| {})).unwrap();
        scheduler.close();

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(
            scheduler.schedule(Box::new(|| {})),
            Err(SchedulerError::Closed)
        );
    }

    #[test]
    fn test_run_until_idle_bounded() {
        let scheduler = LocalScheduler::new();

        // A task that reschedules itself forever.
        fn forever(s: LocalScheduler) {
            let again = s.clone();
            s.schedule(Box::new(move || forever(again))).unwrap();
        }
        forever(scheduler.clone());

        assert_eq!(scheduler.run_until_idle(5), 5);
        assert_eq!(scheduler.pending(), 1);
    }
}
