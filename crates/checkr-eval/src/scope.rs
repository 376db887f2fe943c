//! State shared between the evaluator and the tasks it steps

use crate::evaluator::{TaskResult, WatcherTask};
use crate::event::Event;
use crate::predicate::Predicate;
use crate::wait::{FirstOf, Timeout, Wait, WaitEvent, WaitPred};
use crate::Time;
use futures::FutureExt;
use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

pub(crate) struct TaskEntry {
    pub(crate) name: String,
    pub(crate) future: WatcherTask,
}

/// Total order over virtual time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TimeKey(pub(crate) Time);

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Handle to the evaluator's clock and task set.
///
/// Tasks hold a `Scope` to read the current time, build wait futures and
/// spawn sub-tasks. It never locks the evaluator itself, so it is safe to use
/// from inside a task while the evaluator is stepping it.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    now: Mutex<Time>,
    /// Bumped whenever a wait resolves; the evaluator settles when it stops moving.
    progress: AtomicU64,
    spawned: Mutex<Vec<TaskEntry>>,
    deadlines: Mutex<BinaryHeap<Reverse<TimeKey>>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                now: Mutex::new(0.0),
                progress: AtomicU64::new(0),
                spawned: Mutex::new(Vec::new()),
                deadlines: Mutex::new(BinaryHeap::new()),
            }),
        }
    }

    pub fn now(&self) -> Time {
        *self.inner.now.lock()
    }

    /// Queue a sub-task. It is first polled during the current settle pass
    /// (or the next `run_until` if spawned from outside a task).
    pub fn spawn<F>(&self, name: impl Into<String>, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        self.inner.spawned.lock().push(TaskEntry {
            name: name.into(),
            future: task.boxed(),
        });
    }

    pub fn wait_event(&self, event: impl AsRef<Event>) -> WaitEvent {
        WaitEvent::new(event.as_ref().clone(), self.clone())
    }

    pub fn wait_pred(&self, pred: &Predicate) -> WaitPred {
        WaitPred::new(pred.clone(), self.clone())
    }

    pub fn timeout(&self, delay: Time) -> Timeout {
        Timeout::new(delay, self.clone())
    }

    pub fn first_of(&self, waits: Vec<Wait>) -> FirstOf {
        FirstOf::new(waits)
    }

    pub(crate) fn set_now(&self, t: Time) {
        *self.inner.now.lock() = t;
    }

    pub(crate) fn bump(&self) {
        self.inner.progress.fetch_add(1, AtomicOrdering::SeqCst);
    }

    pub(crate) fn progress(&self) -> u64 {
        self.inner.progress.load(AtomicOrdering::SeqCst)
    }

    pub(crate) fn take_spawned(&self) -> Vec<TaskEntry> {
        std::mem::take(&mut *self.inner.spawned.lock())
    }

    pub(crate) fn spawned_count(&self) -> usize {
        self.inner.spawned.lock().len()
    }

    pub(crate) fn add_deadline(&self, t: Time) {
        self.inner.deadlines.lock().push(Reverse(TimeKey(t)));
    }

    pub(crate) fn next_deadline(&self) -> Option<Time> {
        self.inner.deadlines.lock().peek().map(|Reverse(k)| k.0)
    }

    /// Drop every deadline at or before `t`.
    pub(crate) fn expire_deadlines(&self, t: Time) {
        let mut deadlines = self.inner.deadlines.lock();
        while let Some(Reverse(k)) = deadlines.peek() {
            if k.0 > t {
                break;
            }
            deadlines.pop();
        }
    }
}
