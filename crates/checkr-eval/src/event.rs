//! Events and observer events

use crate::Time;
use checkr_core::Payload;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// A named occurrence that watcher tasks can wait on.
///
/// Cloning an `Event` yields another handle to the same event, so every
/// holder (the agent, the registry, each loaded assertion program) sees the
/// same posts.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

struct EventInner {
    name: String,
    observer: bool,
    state: Mutex<EventState>,
}

#[derive(Default)]
struct EventState {
    /// Number of posts delivered so far.
    generation: u64,
    value: Payload,
    last_posted: Option<Time>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), false)
    }

    fn build(name: String, observer: bool) -> Self {
        Self {
            inner: Arc::new(EventInner {
                name,
                observer,
                state: Mutex::new(EventState::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_observer(&self) -> bool {
        self.inner.observer
    }

    /// How many posts have been delivered to this event.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Virtual time of the most recent delivered post.
    pub fn last_posted(&self) -> Option<Time> {
        self.inner.state.lock().last_posted
    }

    /// Two handles refer to the same event.
    pub fn same(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn value(&self) -> Payload {
        self.inner.state.lock().value.clone()
    }

    /// Called by the evaluator only, one post at a time.
    pub(crate) fn deliver(&self, at: Time, payload: Payload) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.last_posted = Some(at);
        if self.inner.observer {
            state.value = payload;
        } else if !payload.is_empty() {
            trace!(event = %self.inner.name, "payload dropped on plain event");
        }
    }
}

impl AsRef<Event> for Event {
    fn as_ref(&self) -> &Event {
        self
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.inner.name)
            .field("observer", &self.inner.observer)
            .field("generation", &self.generation())
            .finish()
    }
}

/// An event that remembers the payload of its most recent post.
#[derive(Clone, Debug)]
pub struct ObserverEvent {
    event: Event,
}

impl ObserverEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            event: Event::build(name.into(), true),
        }
    }

    /// Payload of the most recent post, `Payload::Empty` before the first.
    pub fn val(&self) -> Payload {
        self.event.value()
    }

    pub fn event(&self) -> &Event {
        &self.event
    }
}

impl std::ops::Deref for ObserverEvent {
    type Target = Event;

    fn deref(&self) -> &Event {
        &self.event
    }
}

impl AsRef<Event> for ObserverEvent {
    fn as_ref(&self) -> &Event {
        &self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_event_ignores_payload() {
        let ev = Event::new("tick");
        ev.deliver(1.0, Payload::Query("x".into()));
        assert_eq!(ev.generation(), 1);
        assert_eq!(ev.value(), Payload::Empty);
        assert_eq!(ev.last_posted(), Some(1.0));
    }

    #[test]
    fn observer_keeps_latest_payload() {
        let ev = ObserverEvent::new("on_query_received");
        assert_eq!(ev.val(), Payload::Empty);
        ev.deliver(0.5, Payload::Query("first".into()));
        ev.deliver(0.7, Payload::Query("second".into()));
        assert_eq!(ev.val(), Payload::Query("second".into()));
        assert_eq!(ev.generation(), 2);
    }

    #[test]
    fn clones_share_state() {
        let a = ObserverEvent::new("e");
        let b = a.clone();
        a.deliver(0.0, Payload::Tool("echo".into()));
        assert!(a.same(&b));
        assert_eq!(b.val(), Payload::Tool("echo".into()));
        assert!(!a.same(&Event::new("e")));
    }
}
