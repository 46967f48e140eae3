//! Deferred computations: promise-like capability and bridges

use super::{Observable, Teardown};
use crate::error::{Result, RxError};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, trace};

/// Callback receiving a resolved value
pub type OnResolve<T> = Box<dyn FnOnce(T) + Send>;

/// Callback receiving a rejection
pub type OnReject = Box<dyn FnOnce(RxError) + Send>;

/// Reports whether attached handlers still want the outcome
pub type IsWanted = Box<dyn Fn() -> bool + Send>;

/// Anything that settles once and reports the outcome to attached handlers
pub trait PromiseLike<T>: Send + Sync {
    /// Attach handlers; exactly one of them is called, at most once.
    /// Handlers attached after settlement are called immediately.
    fn on_settled(&self, on_resolve: OnResolve<T>, on_reject: OnReject);

    /// Like [`PromiseLike::on_settled`], but the handlers may be dropped
    /// uncalled once `wanted` returns `false`.
    ///
    /// The default keeps them until settlement.
    fn on_settled_while(&self, on_resolve: OnResolve<T>, on_reject: OnReject, wanted: IsWanted) {
        let _ = wanted;
        self.on_settled(on_resolve, on_reject);
    }
}

struct Waiter<T> {
    on_resolve: OnResolve<T>,
    on_reject: OnReject,
    wanted: Option<IsWanted>,
}

impl<T> Waiter<T> {
    fn is_wanted(&self) -> bool {
        self.wanted.as_ref().is_none_or(|wanted| wanted())
    }
}

enum PromiseState<T> {
    Pending(Vec<Waiter<T>>),
    Resolved(T),
    Rejected(RxError),
}

/// In-process promise, settled through its [`Resolver`]
pub struct Promise<T> {
    state: Arc<Mutex<PromiseState<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// An unsettled promise and the resolver that settles it
    pub fn pending() -> (Self, Resolver<T>) {
        let state = Arc::new(Mutex::new(PromiseState::Pending(Vec::new())));
        (
            Self {
                state: Arc::clone(&state),
            },
            Resolver { state: Some(state) },
        )
    }

    /// A promise already resolved with `value`
    pub fn resolved(value: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(PromiseState::Resolved(value))),
        }
    }

    /// A promise already rejected with `err`
    pub fn rejected(err: RxError) -> Self {
        Self {
            state: Arc::new(Mutex::new(PromiseState::Rejected(err))),
        }
    }

    /// Whether the promise has resolved or rejected
    pub fn is_settled(&self) -> bool {
        !matches!(*self.state.lock(), PromiseState::Pending(_))
    }

    fn attach(&self, waiter: Waiter<T>) {
        let (outcome, unwanted) = {
            let mut state = self.state.lock();
            match &mut *state {
                PromiseState::Pending(waiters) => {
                    // Unwanted handlers are dropped outside the lock
                    let (keep, unwanted): (Vec<_>, Vec<_>) =
                        std::mem::take(waiters).into_iter().partition(Waiter::is_wanted);
                    *waiters = keep;
                    waiters.push(waiter);
                    (None, unwanted)
                }
                PromiseState::Resolved(value) => (Some((Ok(value.clone()), waiter)), Vec::new()),
                PromiseState::Rejected(err) => (Some((Err(err.clone()), waiter)), Vec::new()),
            }
        };
        if !unwanted.is_empty() {
            trace!(dropped = unwanted.len(), "pruned unwanted promise handlers");
        }
        drop(unwanted);
        match outcome {
            Some((Ok(value), waiter)) => (waiter.on_resolve)(value),
            Some((Err(err), waiter)) => (waiter.on_reject)(err),
            None => {}
        }
    }

    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        match &*self.state.lock() {
            PromiseState::Pending(waiters) => waiters.len(),
            _ => 0,
        }
    }
}

impl<T: Clone + Send + 'static> PromiseLike<T> for Promise<T> {
    fn on_settled(&self, on_resolve: OnResolve<T>, on_reject: OnReject) {
        self.attach(Waiter {
            on_resolve,
            on_reject,
            wanted: None,
        });
    }

    fn on_settled_while(&self, on_resolve: OnResolve<T>, on_reject: OnReject, wanted: IsWanted) {
        self.attach(Waiter {
            on_resolve,
            on_reject,
            wanted: Some(wanted),
        });
    }
}

/// Settles a [`Promise`]. Dropping it unsettled rejects with
/// [`RxError::Abandoned`].
pub struct Resolver<T: Clone + Send + 'static> {
    state: Option<Arc<Mutex<PromiseState<T>>>>,
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Resolve with `value`
    pub fn resolve(mut self, value: T) {
        self.settle(Ok(value));
    }

    /// Reject with `err`
    pub fn reject(mut self, err: RxError) {
        self.settle(Err(err));
    }

    fn settle(&mut self, outcome: Result<T>) {
        let Some(state) = self.state.take() else {
            return;
        };
        let settled = match &outcome {
            Ok(value) => PromiseState::Resolved(value.clone()),
            Err(err) => PromiseState::Rejected(err.clone()),
        };
        let previous = std::mem::replace(&mut *state.lock(), settled);
        let PromiseState::Pending(waiters) = previous else {
            return;
        };
        // Handlers run with the lock released
        for waiter in waiters {
            match &outcome {
                Ok(value) => (waiter.on_resolve)(value.clone()),
                Err(err) => (waiter.on_reject)(err.clone()),
            }
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Resolver<T> {
    fn drop(&mut self) {
        if self.state.is_some() {
            debug!("resolver dropped before settling");
            self.settle(Err(RxError::Abandoned));
        }
    }
}

/// Observable of a deferred computation's outcome
///
/// Resolution delivers one value then completes; rejection delivers the
/// error. Disposing before settlement suppresses delivery. The handlers of
/// a disposed subscription are released when the promise next accepts
/// handlers (for [`Promise`]) or, for other [`PromiseLike`]s that keep the
/// default [`PromiseLike::on_settled_while`], fire into a closed
/// subscription at settlement.
///
/// # Example
/// ```
/// use rxlite::rx::{Promise, from_promise};
///
/// let (promise, resolver) = Promise::pending();
/// let _sub = from_promise(promise).subscribe_next(|v: String| println!("{v}"));
/// resolver.resolve("Promise value received".to_string());
/// ```
pub fn from_promise<T, P>(promise: P) -> Observable<T>
where
    T: Send + 'static,
    P: PromiseLike<T> + 'static,
{
    let promise = Arc::new(promise);
    Observable::new(move |subscriber| {
        let on_value = subscriber.clone();
        let on_error = subscriber.clone();
        promise.on_settled_while(
            Box::new(move |value| {
                on_value.next(value);
                on_value.complete();
            }),
            Box::new(move |err| on_error.error(err)),
            Box::new(move || !subscriber.is_closed()),
        );
        Ok(Teardown::none())
    })
}

/// Observable running a fresh future per subscription on the current
/// tokio runtime
///
/// `Ok` delivers one value then completes, `Err` delivers the error, a
/// panic is delivered as [`RxError::Panicked`]. Disposal aborts the task.
/// Subscribing outside a runtime delivers [`RxError::NoRuntime`].
pub fn from_future<T, F, Fut>(factory: F) -> Observable<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Observable::new(move |subscriber| {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RxError::NoRuntime(e.to_string()))?;
        let future = factory();
        let task = runtime.spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(value)) => {
                    subscriber.next(value);
                    subscriber.complete();
                }
                Ok(Err(err)) => subscriber.error(err),
                Err(payload) => subscriber.error(RxError::from_panic(payload)),
            }
        });
        Ok(Teardown::new(move || task.abort()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_late_handlers_see_settled_value() {
        let promise = Promise::resolved(3);
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        promise.on_settled(Box::new(move |v| *s.lock() = Some(v)), Box::new(|_| {}));
        assert_eq!(*seen.lock(), Some(3));
        assert!(promise.is_settled());
    }

    #[test]
    fn test_pending_handlers_called_on_resolve() {
        let (promise, resolver) = Promise::pending();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let s = Arc::clone(&seen);
            promise.on_settled(Box::new(move |v: i32| s.lock().push(v)), Box::new(|_| {}));
        }
        assert!(!promise.is_settled());
        resolver.resolve(9);
        assert_eq!(*seen.lock(), vec![9, 9]);
    }

    #[test]
    fn test_dropped_resolver_rejects() {
        let (promise, resolver) = Promise::<i32>::pending();
        drop(resolver);
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        promise.on_settled(Box::new(|_| {}), Box::new(move |e| *s.lock() = Some(e)));
        assert!(matches!(*seen.lock(), Some(RxError::Abandoned)));
    }

    #[test]
    fn test_disposed_subscriptions_release_their_handlers() {
        let (promise, resolver) = Promise::<i32>::pending();
        let observable = from_promise(promise.clone());
        for _ in 0..1000 {
            observable.subscribe_next(|_| {}).dispose();
        }
        assert!(promise.waiter_count() <= 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _live = observable.subscribe_next(move |v| s.lock().push(v));
        let _late = observable.subscribe_next(|_| {});
        assert_eq!(promise.waiter_count(), 2);

        resolver.resolve(5);
        assert_eq!(*seen.lock(), vec![5]);
    }

    #[test]
    fn test_from_future_without_runtime_errors() {
        let obs = from_future(|| async { Ok(1) });
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let _sub = obs.subscribe(crate::rx::Observer::on_error(move |e| *s.lock() = Some(e)));
        assert!(matches!(*seen.lock(), Some(RxError::NoRuntime(_))));
    }
}
