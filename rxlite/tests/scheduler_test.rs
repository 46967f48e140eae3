//! Tests for time-based Observables on the virtual scheduler

mod common;

use common::Recorder;
use rxlite::RxError;
use rxlite::rx::{
    Observable, Scheduler, SchedulerRef, Teardown, VirtualScheduler, interval, timer,
};
use std::sync::Arc;
use std::time::Duration;

fn virtual_scheduler() -> (VirtualScheduler, SchedulerRef) {
    let scheduler = VirtualScheduler::new();
    let shared: SchedulerRef = Arc::new(scheduler.clone());
    (scheduler, shared)
}

#[test]
fn test_timer_emits_once_after_delay() {
    let (clock, scheduler) = virtual_scheduler();
    let rec = Recorder::new();
    let _sub = timer(Duration::from_secs(3), scheduler).subscribe(rec.observer());

    clock.advance_by(Duration::from_millis(2999));
    assert_eq!(rec.len(), 0);

    clock.advance_by(Duration::from_millis(1));
    assert_eq!(rec.events(), vec!["next:0", "complete"]);
    assert_eq!(clock.pending(), 0);
}

#[test]
fn test_disposing_timer_cancels_it() {
    let (clock, scheduler) = virtual_scheduler();
    let rec = Recorder::new();
    let sub = timer(Duration::from_secs(3), scheduler).subscribe(rec.observer());

    sub.dispose();
    assert_eq!(clock.pending(), 0);
    clock.advance_by(Duration::from_secs(10));
    assert_eq!(rec.len(), 0);
}

#[test]
fn test_interval_ticks_until_disposed() {
    let (clock, scheduler) = virtual_scheduler();
    let rec = Recorder::new();
    let sub = interval(Duration::from_secs(1), scheduler).subscribe(rec.observer());

    clock.advance_by(Duration::from_millis(3500));
    assert_eq!(rec.events(), vec!["next:0", "next:1", "next:2"]);

    sub.dispose();
    clock.advance_by(Duration::from_secs(5));
    assert_eq!(rec.len(), 3);
    assert_eq!(clock.pending(), 0);
}

#[test]
fn test_emission_scheduled_after_error_is_discarded() {
    // A hand-built source errors synchronously and schedules a late value;
    // the guard drops the late value and teardown cancels the timer.
    let (clock, scheduler) = virtual_scheduler();
    let source: Observable<String> = Observable::new(move |subscriber| {
        subscriber.next("Hello World".to_string());
        subscriber.next("Another Value".to_string());
        subscriber.error(RxError::msg("Error"));

        let late = subscriber.clone();
        let task = scheduler.schedule(
            Duration::from_secs(3),
            Box::new(move || {
                late.next("Yet another value".to_string());
                late.complete();
            }),
        );
        Ok(Teardown::from(task))
    });

    let rec = Recorder::new();
    let _sub = source
        .catch_error(|err| Observable::of(err.to_string()))
        .subscribe(rec.observer());
    assert_eq!(clock.pending(), 0);

    clock.advance_by(Duration::from_secs(3));
    assert_eq!(
        rec.events(),
        vec![
            "next:\"Hello World\"",
            "next:\"Another Value\"",
            "next:\"producer failed: Error\"",
            "complete",
        ]
    );
}

#[test]
fn test_retry_on_timer_failure() {
    let (clock, scheduler) = virtual_scheduler();
    let attempts = Arc::new(parking_lot::Mutex::new(0u32));
    let a = Arc::clone(&attempts);
    let flaky: Observable<u32> = Observable::new(move |subscriber| {
        let attempt = {
            let mut n = a.lock();
            *n += 1;
            *n
        };
        let task = scheduler.schedule(
            Duration::from_secs(1),
            Box::new(move || {
                if attempt < 3 {
                    subscriber.error(RxError::msg(format!("attempt {attempt}")));
                } else {
                    subscriber.next(attempt);
                    subscriber.complete();
                }
            }),
        );
        Ok(Teardown::from(task))
    });

    let rec = Recorder::new();
    let _sub = flaky.retry(5).subscribe(rec.observer());
    clock.advance_by(Duration::from_secs(10));

    assert_eq!(rec.events(), vec!["next:3", "complete"]);
    assert_eq!(*attempts.lock(), 3);
}
