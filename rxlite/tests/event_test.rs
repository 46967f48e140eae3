//! Tests for from_event over EventTarget

mod common;

use common::Recorder;
use parking_lot::Mutex;
use rxlite::rx::{EventSource, EventTarget, Listener, ListenerId, Observable, from_event};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum UiEvent {
    Click { x: i32, y: i32 },
    KeyUp(char),
}

#[test]
fn test_firings_are_forwarded_until_disposed() {
    let button = Arc::new(EventTarget::new());
    let clicks: Observable<UiEvent> = from_event(Arc::clone(&button), "click");
    let rec = Recorder::new();

    let sub = clicks.subscribe(rec.observer());
    assert_eq!(button.listener_count("click"), 1);

    button.dispatch("click", &UiEvent::Click { x: 1, y: 2 });
    button.dispatch("click", &UiEvent::Click { x: 3, y: 4 });
    sub.dispose();
    button.dispatch("click", &UiEvent::Click { x: 5, y: 6 });

    assert_eq!(button.listener_count("click"), 0);
    assert_eq!(
        rec.events(),
        vec![
            "next:Click { x: 1, y: 2 }",
            "next:Click { x: 3, y: 4 }",
        ]
    );
}

#[test]
fn test_event_streams_never_complete_on_their_own() {
    let input = Arc::new(EventTarget::new());
    let keys: Observable<UiEvent> = from_event(Arc::clone(&input), "keyup");
    let rec = Recorder::new();

    let sub = keys.subscribe(rec.observer());
    for c in "rx".chars() {
        input.dispatch("keyup", &UiEvent::KeyUp(c));
    }

    assert_eq!(rec.events(), vec!["next:KeyUp('r')", "next:KeyUp('x')"]);
    assert!(!sub.is_closed());
}

#[test]
fn test_unsubscribing_inside_callback_stops_further_firings() {
    let button = Arc::new(EventTarget::new());
    let clicks: Observable<i32> = from_event(Arc::clone(&button), "click");
    let slot: Arc<Mutex<Option<rxlite::Subscription>>> = Arc::new(Mutex::new(None));
    let rec = Recorder::new();

    let r = rec.clone();
    let sl = Arc::clone(&slot);
    let sub = clicks.subscribe_next(move |v| {
        r.push(format!("next:{v}"));
        let held = sl.lock().take();
        drop(held);
    });
    *slot.lock() = Some(sub);

    button.dispatch("click", &1);
    button.dispatch("click", &2);

    assert_eq!(rec.events(), vec!["next:1"]);
    assert_eq!(button.listener_count("click"), 0);
}

/// Event source that refuses to detach, to exercise teardown failures
struct StickySource {
    inner: EventTarget<i32>,
}

impl EventSource<i32> for StickySource {
    fn add_listener(&self, event: &str, listener: Listener<i32>) -> ListenerId {
        self.inner.add_listener(event, listener)
    }

    fn remove_listener(&self, _event: &str, _id: ListenerId) {
        panic!("listener cannot be removed");
    }
}

#[test]
fn test_failing_listener_removal_does_not_escape_dispose() {
    let source = Arc::new(StickySource {
        inner: EventTarget::new(),
    });
    let obs: Observable<i32> = from_event(Arc::clone(&source), "tick");
    let rec = Recorder::new();
    let sub = obs.subscribe(rec.observer());

    sub.dispose();
    sub.dispose();
    assert!(sub.is_closed());

    // Listener is still attached, but the guard discards its deliveries
    source.inner.dispatch("tick", &1);
    assert_eq!(rec.len(), 0);
}
