//! Emission channel - the guard between a producer and its observer
//!
//! One channel exists per subscription. The producer only ever sees a
//! [`Subscriber`], a non-owning proxy; the [`Subscription`] returned to the
//! consumer owns the channel.
//!
//! ```text
//!            next/error/complete            deliver (lock released)
//! producer ─────────────────────► Channel ─────────────────────────► Observer
//!   (Subscriber, Weak)              │  state: Active | Closing
//!                                   │         | Terminated | Disposed
//!                                   └── teardowns, run once on close
//! ```
//!
//! Delivery is serialized: a signal arriving while a callback for the same
//! subscription is still running is queued and drained, in order, by the
//! thread already delivering.
//!
//! [`Subscription`]: super::Subscription

use super::observer::Observer;
use super::subscription::Teardown;
use crate::error::RxError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Disposal surface of a channel, erased over the value type
pub(crate) trait Lifecycle: Send + Sync {
    fn dispose(&self);
    fn is_closed(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    /// Accepting signals
    Active,
    /// Terminal signal accepted, queued behind an in-flight delivery
    Closing,
    /// Terminal signal delivered (absorbing)
    Terminated,
    /// Disposed by the subscriber (absorbing)
    Disposed,
}

enum Signal<T> {
    Next(T),
    Error(RxError),
    Complete,
}

impl<T> Signal<T> {
    fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

struct Inner<T> {
    state: ChannelState,
    /// `None` while a delivery is in flight or once closed
    observer: Option<Observer<T>>,
    queue: VecDeque<Signal<T>>,
    /// `None` once the teardowns have been executed
    teardowns: Option<Vec<Teardown>>,
}

pub(crate) struct Channel<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Send + 'static> Channel<T> {
    pub(crate) fn new(observer: Observer<T>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: ChannelState::Active,
                observer: Some(observer),
                queue: VecDeque::new(),
                teardowns: Some(Vec::new()),
            }),
        })
    }

    fn emit(&self, signal: Signal<T>) {
        let (mut observer, mut signal) = {
            let mut inner = self.inner.lock();
            if inner.state != ChannelState::Active {
                trace!(state = ?inner.state, "signal dropped by closed channel");
                return;
            }
            match inner.observer.take() {
                Some(observer) => {
                    if signal.is_terminal() {
                        inner.state = ChannelState::Terminated;
                    }
                    (observer, signal)
                }
                None => {
                    if signal.is_terminal() {
                        inner.state = ChannelState::Closing;
                    }
                    inner.queue.push_back(signal);
                    return;
                }
            }
        };

        loop {
            let terminal = signal.is_terminal();
            match signal {
                Signal::Next(value) => observer.deliver_next(value),
                Signal::Error(err) => observer.deliver_error(err),
                Signal::Complete => observer.deliver_complete(),
            }
            if terminal {
                drop(observer);
                self.run_teardowns();
                return;
            }

            let mut inner = self.inner.lock();
            if inner.state == ChannelState::Disposed {
                // Disposed mid-delivery; `dispose` already cleared the queue
                return;
            }
            match inner.queue.pop_front() {
                Some(queued) => {
                    if queued.is_terminal() {
                        inner.state = ChannelState::Terminated;
                    }
                    signal = queued;
                }
                None => {
                    inner.observer = Some(observer);
                    return;
                }
            }
        }
    }

    fn add_teardown(&self, teardown: Teardown) {
        let rejected = {
            let mut inner = self.inner.lock();
            match inner.teardowns.as_mut() {
                Some(teardowns) => {
                    teardowns.push(teardown);
                    None
                }
                None => Some(teardown),
            }
        };
        // Already torn down: run right away
        if let Some(teardown) = rejected {
            teardown.run();
        }
    }

    fn run_teardowns(&self) {
        let teardowns = self.inner.lock().teardowns.take();
        for teardown in teardowns.into_iter().flatten() {
            teardown.run();
        }
    }
}

impl<T: Send + 'static> Lifecycle for Channel<T> {
    fn dispose(&self) {
        let (observer, queue) = {
            let mut inner = self.inner.lock();
            match inner.state {
                ChannelState::Terminated | ChannelState::Disposed => return,
                ChannelState::Active | ChannelState::Closing => {}
            }
            inner.state = ChannelState::Disposed;
            (inner.observer.take(), std::mem::take(&mut inner.queue))
        };
        trace!(dropped = queue.len(), "channel disposed");
        // Release user closures and pending values outside the lock
        drop(observer);
        drop(queue);
        self.run_teardowns();
    }

    fn is_closed(&self) -> bool {
        self.inner.lock().state != ChannelState::Active
    }
}

/// Guarded proxy handed to producers
///
/// Holds only a weak reference to the channel: once the owning
/// [`Subscription`](super::Subscription) is disposed or dropped, every call
/// becomes a no-op. After a terminal signal, further calls are discarded.
pub struct Subscriber<T> {
    channel: Weak<Channel<T>>,
}

impl<T: Send + 'static> Subscriber<T> {
    pub(crate) fn new(channel: &Arc<Channel<T>>) -> Self {
        Self {
            channel: Arc::downgrade(channel),
        }
    }

    /// Emit a value
    pub fn next(&self, value: T) {
        if let Some(channel) = self.channel.upgrade() {
            channel.emit(Signal::Next(value));
        }
    }

    /// Terminate with an error
    pub fn error(&self, err: RxError) {
        if let Some(channel) = self.channel.upgrade() {
            channel.emit(Signal::Error(err));
        }
    }

    /// Terminate successfully
    pub fn complete(&self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.emit(Signal::Complete);
        }
    }

    /// Whether further emissions would be discarded
    pub fn is_closed(&self) -> bool {
        self.channel
            .upgrade()
            .is_none_or(|channel| channel.is_closed())
    }

    /// Register cleanup to run when this subscription closes.
    ///
    /// If it has already closed, the teardown runs immediately.
    pub fn add_teardown(&self, teardown: impl Into<Teardown>) {
        let teardown = teardown.into();
        match self.channel.upgrade() {
            Some(channel) => channel.add_teardown(teardown),
            None => teardown.run(),
        }
    }

    /// Observer forwarding every event into this subscriber
    pub fn into_observer(self) -> Observer<T> {
        let on_error = self.clone();
        let on_complete = self.clone();
        Observer::on_next(move |value| self.next(value))
            .with_error(move |err| on_error.error(err))
            .with_complete(move || on_complete.complete())
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            channel: Weak::clone(&self.channel),
        }
    }
}
