//! Deferred tasks
//!
//! The browser host runs a single event queue; a task scheduled here runs
//! later on that queue and never preempts the caller.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::Result;

/// A deferred task body
pub type Task = Box<dyn FnOnce()>;

/// Opaque handle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub(crate) i64);

pub trait Timer {
    /// Run `task` once after `delay`, returning immediately.
    fn schedule(&self, delay: Duration, task: Task) -> Result<TaskHandle>;

    /// Drop a task that has not fired yet. Unknown or already-fired
    /// handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

/// Virtual-time event queue.
///
/// Nothing runs until [`ManualTimer::advance`] moves time forward; due tasks
/// then fire in deadline order, ties broken by scheduling order.
#[derive(Default)]
pub struct ManualTimer {
    now: Cell<Duration>,
    next_id: Cell<i64>,
    queue: RefCell<BTreeMap<(Duration, i64), Task>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.now.get()
    }

    /// Number of tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move virtual time forward by `by`, firing every task that falls due.
    /// Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;
        loop {
            // Borrow released before the task runs so it may schedule more
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.keys().next().copied() {
                    Some(key) if key.0 <= target => queue.remove(&key).map(|task| (key.0, task)),
                    _ => None,
                }
            };
            let Some((due, task)) = next else { break };
            self.now.set(due);
            task();
            fired += 1;
        }
        self.now.set(target);
        fired
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TaskHandle> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, id), task);
        Ok(TaskHandle(id))
    }

    fn cancel(&self, handle: TaskHandle) {
        self.queue.borrow_mut().retain(|(_, id), _| *id != handle.0);
    }
}
