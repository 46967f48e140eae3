//! Observable implementation (RxJS-like, cold)

use super::channel::{Channel, Subscriber};
use super::observer::Observer;
use super::operators;
use super::stream::ObservableStream;
use super::subscription::{Subscription, Teardown};
use crate::error::{Result, RxError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

type Producer<T> = dyn Fn(Subscriber<T>) -> Result<Teardown> + Send + Sync;

/// Observable - a lazy description of how to produce events
///
/// Nothing runs until [`Observable::subscribe`] is called, and every
/// subscription replays the producer independently. Cloning is cheap and
/// shares the producer, never any running state.
pub struct Observable<T> {
    producer: Arc<Producer<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Observable<T> {
    /// Create an Observable from a producer function
    ///
    /// The producer receives a guarded [`Subscriber`] and returns the cleanup
    /// to run when the subscription closes. Returning `Err` or panicking
    /// delivers an error to the observer instead of unwinding into the
    /// subscriber's code.
    ///
    /// # Example
    /// ```
    /// use rxlite::rx::{Observable, Teardown};
    ///
    /// let greetings = Observable::new(|subscriber| {
    ///     subscriber.next("Hello World");
    ///     subscriber.next("Another Value");
    ///     subscriber.complete();
    ///     Ok(Teardown::none())
    /// });
    ///
    /// let _sub = greetings.subscribe_next(|v| println!("{v}"));
    /// ```
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> Result<Teardown> + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
        }
    }

    /// Subscribe an observer, starting a fresh execution of the producer
    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let channel = Channel::new(observer);
        self.run_producer(&channel);
        Subscription::new(channel)
    }

    /// Subscribe on behalf of an operator whose output is `parent`
    ///
    /// The new subscription is owned by `parent` and is attached to it
    /// before the producer runs, so closing `parent` while this producer is
    /// still emitting synchronously closes this subscription too and the
    /// producer observes it through [`Subscriber::is_closed`]. If `parent`
    /// is already closed, the producer sees a closed subscriber.
    ///
    /// # Example
    /// ```
    /// use rxlite::rx::{Observable, Observer, Subscriber, Teardown};
    ///
    /// // First value only; the infinite source stops after one pull.
    /// fn first<T: Send + 'static>(source: Observable<T>) -> Observable<T> {
    ///     Observable::new(move |subscriber: Subscriber<T>| {
    ///         let out = subscriber.clone();
    ///         source.subscribe_linked(
    ///             Observer::on_next(move |v| {
    ///                 out.next(v);
    ///                 out.complete();
    ///             }),
    ///             &subscriber,
    ///         );
    ///         Ok(Teardown::none())
    ///     })
    /// }
    ///
    /// let _sub = first(Observable::from_iter(0u64..)).subscribe_next(|v| assert_eq!(v, 0));
    /// ```
    pub fn subscribe_linked<P>(&self, observer: Observer<T>, parent: &Subscriber<P>)
    where
        P: Send + 'static,
    {
        let channel = Channel::new(observer);
        parent.add_teardown(Subscription::new(channel.clone()));
        self.run_producer(&channel);
    }

    fn run_producer(&self, channel: &Arc<Channel<T>>) {
        let subscriber = Subscriber::new(channel);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.producer)(subscriber.clone())));
        match outcome {
            Ok(Ok(teardown)) => subscriber.add_teardown(teardown),
            Ok(Err(err)) => {
                debug!(error = %err, "producer failed during subscribe");
                subscriber.error(err);
            }
            Err(payload) => {
                let err = RxError::from_panic(payload);
                debug!(error = %err, "producer panicked during subscribe");
                subscriber.error(err);
            }
        }
    }

    /// Subscribe with next/error/complete callbacks (RxJS style)
    ///
    /// # Example
    /// ```
    /// # use rxlite::rx::Observable;
    /// let obs = Observable::from_array(vec![1, 2, 3]);
    ///
    /// let _sub = obs.subscribe_fns(
    ///     |value| println!("Next: {}", value),
    ///     |err| eprintln!("Error: {}", err),
    ///     || println!("Complete!"),
    /// );
    /// ```
    pub fn subscribe_fns<N, E, C>(&self, next: N, error: E, complete: C) -> Subscription
    where
        N: FnMut(T) + Send + 'static,
        E: FnOnce(RxError) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.subscribe(Observer::from_fns(next, error, complete))
    }

    /// Subscribe with only next callback (simplified)
    pub fn subscribe_next<F>(&self, next: F) -> Subscription
    where
        F: FnMut(T) + Send + 'static,
    {
        self.subscribe(Observer::on_next(next))
    }

    /// Emits a single value, then completes
    pub fn of(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |subscriber| {
            subscriber.next(value.clone());
            subscriber.complete();
            Ok(Teardown::none())
        })
    }

    /// Completes immediately without emitting
    pub fn empty() -> Self {
        Self::new(|subscriber| {
            subscriber.complete();
            Ok(Teardown::none())
        })
    }

    /// Never emits and never terminates
    pub fn never() -> Self {
        Self::new(|_| Ok(Teardown::none()))
    }

    /// Errors immediately with a clone of `err`
    pub fn fail(err: RxError) -> Self {
        Self::new(move |subscriber| {
            subscriber.error(err.clone());
            Ok(Teardown::none())
        })
    }

    /// Emits every element of `values` in order, then completes
    ///
    /// Each subscription replays from the first element.
    pub fn from_array(values: impl Into<Vec<T>>) -> Self
    where
        T: Clone + Sync,
    {
        let values: Vec<T> = values.into();
        let values: Arc<[T]> = values.into();
        Self::new(move |subscriber| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    return Ok(Teardown::none());
                }
                subscriber.next(value.clone());
            }
            subscriber.complete();
            Ok(Teardown::none())
        })
    }

    /// Like [`Observable::from_array`], over any re-iterable collection
    pub fn from_iter<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Self::new(move |subscriber| {
            for value in iterable.clone() {
                if subscriber.is_closed() {
                    return Ok(Teardown::none());
                }
                subscriber.next(value);
            }
            subscriber.complete();
            Ok(Teardown::none())
        })
    }

    /// Recover from an error by switching to the Observable built by `handler`
    ///
    /// See [`operators::catch_error`].
    pub fn catch_error<H>(self, handler: H) -> Observable<T>
    where
        H: Fn(RxError) -> Observable<T> + Send + Sync + 'static,
    {
        operators::catch_error(self, handler)
    }

    /// Map operator - transform values
    pub fn map<F, R>(self, f: F) -> Observable<R>
    where
        F: Fn(T) -> R + Send + Sync + 'static,
        R: Send + 'static,
    {
        operators::map(self, f)
    }

    /// Resubscribe on error, at most `count` times
    pub fn retry(self, count: usize) -> Observable<T> {
        operators::retry(self, count)
    }

    /// Subscribe and expose the events as a `futures::Stream`
    ///
    /// Values arrive as `Ok`, an error as a final `Err`; completion ends
    /// the stream. Dropping the stream disposes the subscription.
    pub fn into_stream(&self) -> ObservableStream<T> {
        ObservableStream::subscribe(self)
    }
}

impl<T> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn collect<T: Send + std::fmt::Debug + 'static>(
        obs: &Observable<T>,
    ) -> (Subscription, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (l1, l2, l3) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let sub = obs.subscribe_fns(
            move |v| l1.lock().push(format!("{v:?}")),
            move |e| l2.lock().push(format!("error:{e}")),
            move || l3.lock().push("complete".to_string()),
        );
        (sub, log)
    }

    #[test]
    fn test_of_and_empty() {
        let (_s, log) = collect(&Observable::of(5));
        assert_eq!(*log.lock(), vec!["5", "complete"]);

        let (_s, log) = collect(&Observable::<i32>::empty());
        assert_eq!(*log.lock(), vec!["complete"]);
    }

    #[test]
    fn test_never_stays_open_until_disposed() {
        let (sub, log) = collect(&Observable::<i32>::never());
        assert!(!sub.is_closed());
        sub.dispose();
        assert!(sub.is_closed());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_fail_delivers_error() {
        let (sub, log) = collect(&Observable::<i32>::fail(RxError::msg("nope")));
        assert_eq!(*log.lock(), vec!["error:producer failed: nope"]);
        assert!(sub.is_closed());
    }

    #[test]
    fn test_from_iter_replays() {
        let obs = Observable::from_iter(1..=3);
        let (_a, first) = collect(&obs);
        let (_b, second) = collect(&obs);
        assert_eq!(*first.lock(), vec!["1", "2", "3", "complete"]);
        assert_eq!(*first.lock(), *second.lock());
    }

    #[test]
    fn test_producer_err_is_redirected() {
        let obs: Observable<i32> = Observable::new(|subscriber| {
            subscriber.next(1);
            Err(RxError::msg("broken"))
        });
        let (_s, log) = collect(&obs);
        assert_eq!(*log.lock(), vec!["1", "error:producer failed: broken"]);
    }

    #[test]
    fn test_teardown_runs_when_synchronously_completed() {
        let torn = Arc::new(Mutex::new(false));
        let t = Arc::clone(&torn);
        let obs: Observable<i32> = Observable::new(move |subscriber| {
            subscriber.complete();
            let t = Arc::clone(&t);
            Ok(Teardown::new(move || *t.lock() = true))
        });
        let (sub, _log) = collect(&obs);
        assert!(*torn.lock());
        assert!(sub.is_closed());
    }
}
