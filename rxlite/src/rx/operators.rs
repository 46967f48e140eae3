//! RxJS-style operators
//!
//! [`catch_error`] is the composition primitive; [`map`] and [`retry`] are
//! built on the same subscribe-and-forward contract. Upstreams are
//! subscribed with [`Observable::subscribe_linked`], so closing the output
//! closes the upstream even while it is still emitting synchronously.

use super::{Observable, Observer, Subscriber, Teardown};
use crate::error::RxError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Catch operator - replace an error with another Observable
///
/// Values and completion from `source` pass through. When `source` errors,
/// `handler` builds a replacement whose events (including its own error or
/// completion) become the output's events; the original error is never
/// forwarded. Disposing the output before the replacement starts prevents
/// it from ever being subscribed.
///
/// # Example
/// ```
/// # use rxlite::rx::{Observable, operators::catch_error};
/// # use rxlite::RxError;
/// let failing = Observable::<i32>::fail(RxError::msg("offline"));
/// let recovered = catch_error(failing, |_err| Observable::of(0));
/// let _sub = recovered.subscribe_next(|v| assert_eq!(v, 0));
/// ```
pub fn catch_error<T, H>(source: Observable<T>, handler: H) -> Observable<T>
where
    T: Send + 'static,
    H: Fn(RxError) -> Observable<T> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    Observable::new(move |subscriber: Subscriber<T>| {
        let handler = Arc::clone(&handler);
        let on_next = subscriber.clone();
        let on_complete = subscriber.clone();
        let downstream = subscriber.clone();

        source.subscribe_linked(
            Observer::on_next(move |value| on_next.next(value))
                .with_error(move |err| resume(&downstream, handler.as_ref(), err))
                .with_complete(move || on_complete.complete()),
            &subscriber,
        );
        Ok(Teardown::none())
    })
}

fn resume<T, H>(downstream: &Subscriber<T>, handler: &H, err: RxError)
where
    T: Send + 'static,
    H: Fn(RxError) -> Observable<T>,
{
    if downstream.is_closed() {
        debug!(error = %err, "catch_error: downstream closed, handler skipped");
        return;
    }

    let replacement = match panic::catch_unwind(AssertUnwindSafe(|| handler(err))) {
        Ok(replacement) => replacement,
        Err(payload) => {
            downstream.error(RxError::from_panic(payload));
            return;
        }
    };

    // The handler itself may have disposed the outer subscription
    if downstream.is_closed() {
        debug!("catch_error: downstream closed by handler, replacement not subscribed");
        return;
    }

    replacement.subscribe_linked(downstream.clone().into_observer(), downstream);
}

/// Map operator - transform values
///
/// # Example
/// ```
/// # use rxlite::rx::{Observable, operators::map};
/// let doubled = map(Observable::from_array(vec![1, 2, 3]), |v| v * 2);
/// let _sub = doubled.subscribe_next(|v| println!("{v}"));
/// ```
pub fn map<T, R, F>(source: Observable<T>, f: F) -> Observable<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Observable::new(move |subscriber: Subscriber<R>| {
        let f = Arc::clone(&f);
        let on_next = subscriber.clone();
        let on_error = subscriber.clone();
        let on_complete = subscriber.clone();

        source.subscribe_linked(
            Observer::on_next(move |value| on_next.next(f(value)))
                .with_error(move |err| on_error.error(err))
                .with_complete(move || on_complete.complete()),
            &subscriber,
        );
        Ok(Teardown::none())
    })
}

/// Retry operator - resubscribe on error
///
/// Up to `count` fresh subscriptions to `source` are made after the first
/// one fails; the last error is forwarded if they all fail. Expressed as
/// nested [`catch_error`], so cancellation is checked before each attempt.
///
/// # Example
/// ```
/// # use rxlite::rx::{Observable, operators::retry};
/// let obs = Observable::from_array(vec![1, 2, 3]);
/// let with_retry = retry(obs, 3);
/// ```
pub fn retry<T: Send + 'static>(source: Observable<T>, count: usize) -> Observable<T> {
    if count == 0 {
        return source;
    }
    let again = source.clone();
    catch_error(source, move |err| {
        debug!(error = %err, remaining = count - 1, "retrying after error");
        retry(again.clone(), count - 1)
    })
}
