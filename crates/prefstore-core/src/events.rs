//! Change listener registry
//!
//! Events are queued in commit order and delivered by whichever thread finds
//! the queue idle; other committers return as soon as their event is queued.
//! Owners enqueue while holding their commit lock and drain after releasing
//! it, so a listener never runs under a store lock and may read the store,
//! write to any store, or unsubscribe. A write made from inside a listener is
//! delivered after the event currently being handled.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Outbox<E> {
    queue: VecDeque<E>,
    draining: bool,
}

/// Ordered set of listeners for events of type `E`
pub(crate) struct ListenerSet<E> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Listener<E>)>>,
    outbox: Mutex<Outbox<E>>,
}

impl<E: Send + 'static> ListenerSet<E> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            entries: RwLock::new(Vec::new()),
            outbox: Mutex::new(Outbox {
                queue: VecDeque::new(),
                draining: false,
            }),
        })
    }

    /// Register a listener; it stays registered until the returned
    /// subscription is dropped or unsubscribed
    pub(crate) fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push((id, Arc::new(listener)));

        let set: Weak<Self> = Arc::downgrade(self);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(set) = set.upgrade() {
                    set.entries.write().retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Queue an event for delivery by the next [`drain`](Self::drain)
    pub(crate) fn enqueue(&self, event: E) {
        self.outbox.lock().queue.push_back(event);
    }

    /// Deliver queued events in order, unless another drain is running
    pub(crate) fn drain(&self) {
        {
            let mut outbox = self.outbox.lock();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }
        let mut guard = DrainGuard {
            outbox: &self.outbox,
            armed: true,
        };

        loop {
            let event = {
                let mut outbox = self.outbox.lock();
                match outbox.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        // Cleared under the same lock that saw the queue empty
                        outbox.draining = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            self.deliver(&event);
        }
    }

    #[cfg(test)]
    pub(crate) fn emit(&self, event: E) {
        self.enqueue(event);
        self.drain();
    }

    fn deliver(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self
            .entries
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Clears the draining flag if a listener panics mid-drain
struct DrainGuard<'a, E> {
    outbox: &'a Mutex<Outbox<E>>,
    armed: bool,
}

impl<E> Drop for DrainGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            self.outbox.lock().draining = false;
        }
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes; call [`Subscription::detach`] to keep
/// the listener for the lifetime of the store instead.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener registered without holding the handle
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emit_in_registration_order() {
        let set = ListenerSet::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = {
            let seen = Arc::clone(&seen);
            set.subscribe(move |e| seen.lock().push(("a", *e)))
        };
        let b = {
            let seen = Arc::clone(&seen);
            set.subscribe(move |e| seen.lock().push(("b", *e)))
        };

        set.emit(1);
        set.emit(2);

        assert_eq!(*seen.lock(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
        drop((a, b));
    }

    #[test]
    fn test_event_queued_by_listener_follows_current_event() {
        let set = ListenerSet::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&set);
        let sink = Arc::clone(&seen);
        set.subscribe(move |e| {
            sink.lock().push(("first", *e));
            if *e == 1 {
                if let Some(set) = weak.upgrade() {
                    set.emit(2);
                }
            }
        })
        .detach();
        let sink = Arc::clone(&seen);
        set.subscribe(move |e| sink.lock().push(("second", *e))).detach();

        set.emit(1);

        assert_eq!(
            *seen.lock(),
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
        );
    }

    #[test]
    fn test_panicking_listener_does_not_stall_delivery() {
        let set = ListenerSet::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        set.subscribe(move |e| {
            if *e == 1 {
                panic!("listener failure");
            }
            sink.lock().push(*e);
        })
        .detach();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| set.emit(1)));
        assert!(result.is_err());

        set.emit(2);
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let set = ListenerSet::<()>::new();
        let sub = set.subscribe(|_| {});
        assert_eq!(set.len(), 1);
        drop(sub);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let set = ListenerSet::<()>::new();
        set.subscribe(|_| {}).detach();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unsubscribe_after_set_dropped() {
        let set = ListenerSet::<()>::new();
        let sub = set.subscribe(|_| {});
        drop(set);
        sub.unsubscribe();
    }
}
