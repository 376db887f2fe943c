//! Wait primitives used inside watcher tasks
//!
//! None of these futures register wakers. They are only meaningful inside
//! tasks stepped by the [`Evaluator`](crate::Evaluator), which re-polls every
//! pending task after each delivered post.

use crate::event::Event;
use crate::predicate::Predicate;
use crate::scope::Scope;
use crate::Time;
use checkr_core::Payload;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Resolves on the first post to `event` delivered after this wait was first
/// polled, yielding that post's payload.
pub struct WaitEvent {
    event: Event,
    scope: Scope,
    baseline: Option<u64>,
}

impl WaitEvent {
    pub(crate) fn new(event: Event, scope: Scope) -> Self {
        Self {
            event,
            scope,
            baseline: None,
        }
    }

    fn poll_wait(&mut self) -> Poll<Payload> {
        let generation = self.event.generation();
        match self.baseline {
            None => {
                self.baseline = Some(generation);
                Poll::Pending
            }
            Some(seen) if generation > seen => {
                self.baseline = Some(generation);
                self.scope.bump();
                Poll::Ready(self.event.value())
            }
            Some(_) => Poll::Pending,
        }
    }
}

impl Future for WaitEvent {
    type Output = Payload;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Payload> {
        self.get_mut().poll_wait()
    }
}

/// Resolves as soon as the predicate evaluates true.
pub struct WaitPred {
    pred: Predicate,
    scope: Scope,
}

impl WaitPred {
    pub(crate) fn new(pred: Predicate, scope: Scope) -> Self {
        Self { pred, scope }
    }

    fn poll_wait(&mut self) -> Poll<()> {
        if self.pred.eval() {
            self.scope.bump();
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl Future for WaitPred {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        self.get_mut().poll_wait()
    }
}

/// Resolves once virtual time has advanced `delay` past the first poll.
pub struct Timeout {
    delay: Time,
    deadline: Option<Time>,
    scope: Scope,
}

impl Timeout {
    pub(crate) fn new(delay: Time, scope: Scope) -> Self {
        Self {
            delay,
            deadline: None,
            scope,
        }
    }

    pub fn deadline(&self) -> Option<Time> {
        self.deadline
    }

    fn poll_wait(&mut self) -> Poll<()> {
        let now = self.scope.now();
        let deadline = match self.deadline {
            Some(d) => d,
            None => {
                let d = now + self.delay.max(0.0);
                self.deadline = Some(d);
                self.scope.add_deadline(d);
                d
            }
        };
        if now >= deadline {
            self.scope.bump();
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl Future for Timeout {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        self.get_mut().poll_wait()
    }
}

/// One arm of a [`FirstOf`].
pub enum Wait {
    Event(WaitEvent),
    Pred(WaitPred),
    Timeout(Timeout),
}

impl Wait {
    fn poll_wait(&mut self) -> Poll<Payload> {
        match self {
            Wait::Event(w) => w.poll_wait(),
            Wait::Pred(w) => w.poll_wait().map(|()| Payload::Empty),
            Wait::Timeout(w) => w.poll_wait().map(|()| Payload::Empty),
        }
    }
}

impl From<WaitEvent> for Wait {
    fn from(w: WaitEvent) -> Self {
        Wait::Event(w)
    }
}

impl From<WaitPred> for Wait {
    fn from(w: WaitPred) -> Self {
        Wait::Pred(w)
    }
}

impl From<Timeout> for Wait {
    fn from(w: Timeout) -> Self {
        Wait::Timeout(w)
    }
}

/// Resolves with `(index, payload)` of the first arm to resolve. Arms are
/// checked in order, so the lowest index wins a tie.
pub struct FirstOf {
    waits: Vec<Wait>,
}

impl FirstOf {
    pub(crate) fn new(waits: Vec<Wait>) -> Self {
        Self { waits }
    }
}

impl Future for FirstOf {
    type Output = (usize, Payload);

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<(usize, Payload)> {
        let this = self.get_mut();
        // Every arm is polled so that each one registers its baseline on the
        // first poll, even when an earlier arm is already ready.
        let mut winner = None;
        for (i, wait) in this.waits.iter_mut().enumerate() {
            if let Poll::Ready(payload) = wait.poll_wait() {
                if winner.is_none() {
                    winner = Some((i, payload));
                }
            }
        }
        match winner {
            Some(w) => Poll::Ready(w),
            None => Poll::Pending,
        }
    }
}
