//! Native event sources and the `from_event` constructor
//!
//! [`EventSource`] is the capability an event-emitting object must offer.
//! [`EventTarget`] is an in-process implementation keyed by event name.
//!
//! Payloads are typed: integrations map their native event objects to an
//! `E` before dispatching, so the core never sees untyped data.

use super::{Observable, Teardown};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Identifier returned by [`EventSource::add_listener`]
pub type ListenerId = u64;

/// Listener callback type
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Anything offering named add/remove listener registration
pub trait EventSource<E>: Send + Sync {
    /// Register `listener` for `event` and return its id
    fn add_listener(&self, event: &str, listener: Listener<E>) -> ListenerId;

    /// Remove the listener `id` from `event`; unknown ids are ignored
    fn remove_listener(&self, event: &str, id: ListenerId);
}

/// Synchronous named-event dispatcher
///
/// Dispatch iterates a snapshot taken under the lock and calls listeners
/// with the lock released, so listeners may add or remove listeners
/// (including themselves) while being called. A listener removed during a
/// dispatch is still called in that round.
pub struct EventTarget<E> {
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener<E>)>>>,
    next_id: AtomicU64,
}

impl<E> EventTarget<E> {
    /// Create a target with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Fire `event` with `payload` to every listener registered for it
    pub fn dispatch(&self, event: &str, payload: &E) {
        let snapshot: Vec<Listener<E>> = {
            let guard = self.listeners.lock();
            match guard.get(event) {
                Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };
        for listener in snapshot {
            listener(payload);
        }
    }

    /// Number of listeners currently registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }
}

impl<E> Default for EventTarget<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventSource<E> for EventTarget<E> {
    fn add_listener(&self, event: &str, listener: Listener<E>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        let mut guard = self.listeners.lock();
        if let Some(entries) = guard.get_mut(event) {
            entries.retain(|(lid, _)| *lid != id);
            if entries.is_empty() {
                guard.remove(event);
            }
        }
    }
}

/// Observable of every firing of `event` on `source`
///
/// Each subscription attaches its own listener and removes it on disposal.
/// Never completes on its own.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use rxlite::rx::{EventTarget, Observable, from_event};
///
/// let button = Arc::new(EventTarget::<(u16, u16)>::new());
/// let clicks: Observable<(u16, u16)> = from_event(Arc::clone(&button), "click");
///
/// let sub = clicks.subscribe_next(|(x, y)| println!("click at {x},{y}"));
/// button.dispatch("click", &(3, 4));
/// sub.dispose();
/// assert_eq!(button.listener_count("click"), 0);
/// ```
pub fn from_event<E, S>(source: Arc<S>, event: impl Into<String>) -> Observable<E>
where
    E: Clone + Send + 'static,
    S: EventSource<E> + ?Sized + 'static,
{
    let event: Arc<str> = Arc::from(event.into());
    Observable::new(move |subscriber| {
        let forward = subscriber.clone();
        let listener: Listener<E> = Arc::new(move |payload: &E| forward.next(payload.clone()));
        let id = source.add_listener(&event, listener);
        debug!(event = %event, listener = id, "event listener attached");

        let source = Arc::clone(&source);
        let event = Arc::clone(&event);
        Ok(Teardown::new(move || {
            source.remove_listener(&event, id);
            debug!(event = %event, listener = id, "event listener removed");
        }))
    })
}
