//! Virtual-time evaluator
//!
//! Posts are queued with a timestamp and delivered in `(time, sequence)`
//! order. After each delivery every task is polled until a full pass makes no
//! progress, so all consequences of one post are resolved before the next is
//! delivered.

use crate::error::{EvalError, EvalResult};
use crate::event::Event;
use crate::scope::{Scope, TaskEntry};
use crate::Time;
use checkr_core::Payload;
use futures::future::BoxFuture;
use futures::task::noop_waker;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, error, trace};

pub type TaskResult = Result<(), EvalError>;

/// A watcher task: an async routine stepped only by the evaluator.
pub type WatcherTask = BoxFuture<'static, TaskResult>;

/// One evaluator shared by several agents. The lock is held for a whole
/// post-and-advance so concurrent callers are serialized.
pub type SharedEvaluator = Arc<Mutex<Evaluator>>;

const DEFAULT_MAX_PASSES: usize = 10_000;

struct Posting {
    time: Time,
    seq: u64,
    event: Event,
    payload: Payload,
}

impl PartialEq for Posting {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Posting {}

impl PartialOrd for Posting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Posting {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest time, then earliest post)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Evaluator {
    scope: Scope,
    tasks: Vec<TaskEntry>,
    queue: BinaryHeap<Posting>,
    seq: u64,
    max_passes: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            scope: Scope::new(),
            tasks: Vec::new(),
            queue: BinaryHeap::new(),
            seq: 0,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Bound on settle passes per step before reporting a livelock.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    pub fn shared(self) -> SharedEvaluator {
        Arc::new(Mutex::new(self))
    }

    pub fn scope(&self) -> Scope {
        self.scope.clone()
    }

    /// Last advanced virtual time.
    pub fn now(&self) -> Time {
        self.scope.now()
    }

    /// Live tasks, including ones spawned but not yet polled.
    pub fn task_count(&self) -> usize {
        self.tasks.len() + self.scope.spawned_count()
    }

    pub fn pending_posts(&self) -> usize {
        self.queue.len()
    }

    /// Start a root task. It is first polled by the next `run_until`.
    pub fn start<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let name = name.into();
        debug!(task = %name, "starting watcher");
        self.scope.spawn(name, task);
    }

    /// Schedule `payload` for delivery to `event` at time `t`.
    pub fn post_at(&mut self, t: Time, event: &Event, payload: Payload) -> EvalResult<()> {
        let current = self.now();
        if t < current {
            return Err(EvalError::ClockRegression {
                requested: t,
                current,
            });
        }
        self.seq += 1;
        trace!(event = %event.name(), t, seq = self.seq, "post queued");
        self.queue.push(Posting {
            time: t,
            seq: self.seq,
            event: event.clone(),
            payload,
        });
        Ok(())
    }

    /// Advance the clock to `t`, delivering every post and expiring every
    /// timeout scheduled at or before `t`.
    pub fn run_until(&mut self, t: Time) -> EvalResult<()> {
        let current = self.now();
        if t < current {
            return Err(EvalError::ClockRegression {
                requested: t,
                current,
            });
        }

        self.settle()?;

        loop {
            let next_post = self.queue.peek().map(|p| p.time);
            let next_timer = self.scope.next_deadline();
            let step = match (next_post, next_timer) {
                (Some(p), Some(d)) => Some(p.min(d)),
                (p, d) => p.or(d),
            };
            let Some(step) = step.filter(|s| *s <= t) else {
                break;
            };

            self.scope.set_now(step.max(self.now()));
            if next_post == Some(step) {
                if let Some(posting) = self.queue.pop() {
                    debug!(event = %posting.event.name(), t = posting.time, "delivering");
                    posting.event.deliver(posting.time, posting.payload);
                }
            }
            self.scope.expire_deadlines(step);
            self.settle()?;
        }

        self.scope.set_now(t);
        self.settle()
    }

    /// Poll every task until a full pass makes no progress.
    fn settle(&mut self) -> EvalResult<()> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        for _ in 0..self.max_passes {
            self.tasks.extend(self.scope.take_spawned());
            let before = self.scope.progress();
            let mut failure: Option<EvalError> = None;

            self.tasks.retain_mut(|task| match task.future.as_mut().poll(&mut cx) {
                Poll::Pending => true,
                Poll::Ready(Ok(())) => {
                    debug!(task = %task.name, "watcher finished");
                    false
                }
                Poll::Ready(Err(e)) => {
                    error!(task = %task.name, "watcher failed: {}", e);
                    failure.get_or_insert(e);
                    false
                }
            });

            if let Some(e) = failure {
                return Err(e);
            }
            if self.scope.progress() == before && self.scope.spawned_count() == 0 {
                return Ok(());
            }
        }

        Err(EvalError::Livelock {
            time: self.now(),
            passes: self.max_passes,
        })
    }
}
