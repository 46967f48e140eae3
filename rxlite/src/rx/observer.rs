//! Observer - the three handler slots consuming an Observable's events

use crate::error::RxError;
use tracing::debug;

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnOnce(RxError) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// Observer - similar to an RxJS Observer, with named optional slots
///
/// Every constructor takes at least one handler, so an observer that
/// listens to nothing cannot be built. Missing slots are no-ops; a missing
/// `error` slot swallows the error.
///
/// # Example
/// ```
/// use rxlite::rx::{Observable, Observer};
///
/// let obs = Observable::from_array(vec![1, 2, 3]);
/// let _sub = obs.subscribe(
///     Observer::on_next(|v: i32| println!("next: {v}"))
///         .with_error(|err| eprintln!("error: {err}"))
///         .with_complete(|| println!("complete")),
/// );
/// ```
pub struct Observer<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> Observer<T> {
    /// Observer with a `next` handler
    pub fn on_next<F>(next: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self {
            next: Some(Box::new(next)),
            error: None,
            complete: None,
        }
    }

    /// Observer with an `error` handler
    pub fn on_error<F>(error: F) -> Self
    where
        F: FnOnce(RxError) + Send + 'static,
    {
        Self {
            next: None,
            error: Some(Box::new(error)),
            complete: None,
        }
    }

    /// Observer with a `complete` handler
    pub fn on_complete<F>(complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            next: None,
            error: None,
            complete: Some(Box::new(complete)),
        }
    }

    /// Observer with all three handlers (RxJS positional style)
    pub fn from_fns<N, E, C>(next: N, error: E, complete: C) -> Self
    where
        N: FnMut(T) + Send + 'static,
        E: FnOnce(RxError) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        Self {
            next: Some(Box::new(next)),
            error: Some(Box::new(error)),
            complete: Some(Box::new(complete)),
        }
    }

    /// Set or replace the `next` handler
    pub fn with_next<F>(mut self, next: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        self.next = Some(Box::new(next));
        self
    }

    /// Set or replace the `error` handler
    pub fn with_error<F>(mut self, error: F) -> Self
    where
        F: FnOnce(RxError) + Send + 'static,
    {
        self.error = Some(Box::new(error));
        self
    }

    /// Set or replace the `complete` handler
    pub fn with_complete<F>(mut self, complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.complete = Some(Box::new(complete));
        self
    }

    pub(crate) fn deliver_next(&mut self, value: T) {
        if let Some(next) = self.next.as_mut() {
            next(value);
        }
    }

    pub(crate) fn deliver_error(&mut self, err: RxError) {
        match self.error.take() {
            Some(error) => error(err),
            None => debug!(error = %err, "error reached an observer without an error handler"),
        }
    }

    pub(crate) fn deliver_complete(&mut self) {
        if let Some(complete) = self.complete.take() {
            complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_missing_slots_are_noops() {
        let mut observer: Observer<i32> = Observer::on_complete(|| {});
        observer.deliver_next(1);
        observer.deliver_error(RxError::msg("ignored"));
        observer.deliver_complete();
    }

    #[test]
    fn test_builder_replaces_slots() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l1 = Arc::clone(&log);
        let l2 = Arc::clone(&log);

        let mut observer = Observer::on_next(move |v: i32| l1.lock().push(format!("a{v}")))
            .with_next(move |v: i32| l2.lock().push(format!("b{v}")));
        observer.deliver_next(7);

        assert_eq!(*log.lock(), vec!["b7"]);
    }

    #[test]
    fn test_terminal_handlers_fire_once() {
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        let mut observer: Observer<()> = Observer::on_complete(move || *c.lock() += 1);
        observer.deliver_complete();
        observer.deliver_complete();
        assert_eq!(*count.lock(), 1);
    }
}
