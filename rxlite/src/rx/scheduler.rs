//! Injected scheduling capability and time-based constructors
//!
//! Timers never reach for an ambient event loop: every time-based
//! Observable takes a [`Scheduler`]. [`TokioScheduler`] runs on a tokio
//! runtime; [`VirtualScheduler`] is a manual clock for deterministic tests.

use super::{Observable, Subscriber, Teardown};
use crate::error::{Result, RxError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce() + Send>;

/// Shared scheduler handle
pub type SchedulerRef = Arc<dyn Scheduler>;

/// Something that can run a task later
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask;
}

/// Handle to a scheduled task; cancelling prevents it from running if it
/// has not started. Dropping the handle does not cancel.
#[must_use = "keep the handle to be able to cancel the task"]
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ScheduledTask {
    /// Handle with a cancellation hook
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the task
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl From<ScheduledTask> for Teardown {
    fn from(task: ScheduledTask) -> Self {
        Teardown::new(move || task.cancel())
    }
}

/// Scheduler backed by a tokio runtime
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Use the runtime of the calling context
    pub fn current() -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RxError::NoRuntime(e.to_string()))?;
        Ok(Self { runtime })
    }

    /// Use an explicit runtime handle
    pub fn with_handle(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask {
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        ScheduledTask::new(move || handle.abort())
    }
}

#[derive(Default)]
struct VirtualState {
    now: Duration,
    seq: u64,
    tasks: BTreeMap<(Duration, u64), Task>,
}

/// Manually advanced clock for tests
///
/// Tasks run in due-time order, ties in scheduling order, on the thread
/// calling [`VirtualScheduler::advance_by`].
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualScheduler {
    /// Clock at zero with nothing scheduled
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Move the clock forward, running every task that falls due.
    ///
    /// Tasks scheduled by running tasks are run too if they fall due within
    /// the window.
    pub fn advance_by(&self, by: Duration) {
        let target = self.state.lock().now + by;
        loop {
            let task = {
                let mut state = self.state.lock();
                let next_due = state.tasks.first_key_value().map(|(&(due, _), _)| due);
                match next_due {
                    Some(due) if due <= target => {
                        state.now = due;
                        state.tasks.pop_first().map(|(_, task)| task)
                    }
                    _ => None,
                }
            };
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        self.state.lock().now = target;
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask {
        let key = {
            let mut state = self.state.lock();
            let key = (state.now + delay, state.seq);
            state.seq += 1;
            state.tasks.insert(key, task);
            key
        };
        let state = Arc::clone(&self.state);
        ScheduledTask::new(move || {
            // Drop the task outside the lock
            let removed = state.lock().tasks.remove(&key);
            drop(removed);
        })
    }
}

/// Emits `0` after `delay`, then completes. Disposal cancels the timer.
pub fn timer(delay: Duration, scheduler: SchedulerRef) -> Observable<u64> {
    Observable::new(move |subscriber: Subscriber<u64>| {
        let task = scheduler.schedule(
            delay,
            Box::new(move || {
                subscriber.next(0);
                subscriber.complete();
            }),
        );
        Ok(Teardown::from(task))
    })
}

/// Emits `0, 1, 2, ...` every `period`. Never completes; disposal cancels
/// the pending tick.
pub fn interval(period: Duration, scheduler: SchedulerRef) -> Observable<u64> {
    Observable::new(move |subscriber: Subscriber<u64>| {
        let pending: Arc<Mutex<Option<ScheduledTask>>> = Arc::new(Mutex::new(None));
        schedule_tick(Arc::clone(&scheduler), period, subscriber, 0, Arc::clone(&pending));
        Ok(Teardown::new(move || {
            let task = pending.lock().take();
            if let Some(task) = task {
                task.cancel();
            }
        }))
    })
}

fn schedule_tick(
    scheduler: SchedulerRef,
    period: Duration,
    subscriber: Subscriber<u64>,
    tick: u64,
    pending: Arc<Mutex<Option<ScheduledTask>>>,
) {
    let next_scheduler = Arc::clone(&scheduler);
    let next_pending = Arc::clone(&pending);
    let task = scheduler.schedule(
        period,
        Box::new(move || {
            if subscriber.is_closed() {
                trace!(tick, "interval stopped");
                return;
            }
            subscriber.next(tick);
            schedule_tick(next_scheduler, period, subscriber, tick + 1, next_pending);
        }),
    );
    *pending.lock() = Some(task);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_scheduler_orders_by_due_time() {
        let scheduler = VirtualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (name, ms) in [("late", 30), ("early", 10), ("tie-a", 20), ("tie-b", 20)] {
            let l = Arc::clone(&log);
            let _ = scheduler.schedule(
                Duration::from_millis(ms),
                Box::new(move || l.lock().push(name)),
            );
        }

        scheduler.advance_by(Duration::from_millis(20));
        assert_eq!(*log.lock(), vec!["early", "tie-a", "tie-b"]);
        assert_eq!(scheduler.now(), Duration::from_millis(20));
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance_by(Duration::from_millis(10));
        assert_eq!(*log.lock(), vec!["early", "tie-a", "tie-b", "late"]);
    }

    #[test]
    fn test_cancel_removes_virtual_task() {
        let scheduler = VirtualScheduler::new();
        let ran = Arc::new(Mutex::new(false));
        let r = Arc::clone(&ran);
        let task = scheduler.schedule(Duration::from_secs(1), Box::new(move || *r.lock() = true));
        task.cancel();
        scheduler.advance_by(Duration::from_secs(5));
        assert!(!*ran.lock());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_runs_after_delay() {
        let scheduler = TokioScheduler::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let _task = scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let _ = tx.send("fired");
            }),
        );
        assert_eq!(rx.await.unwrap(), "fired");
    }

    #[test]
    fn test_tokio_scheduler_requires_runtime() {
        assert!(matches!(TokioScheduler::current(), Err(RxError::NoRuntime(_))));
    }
}
