//! Subscription handles and teardown actions

use super::channel::Lifecycle;
use crate::error::{Result, RxError};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

type TeardownFn = Box<dyn FnOnce() -> Result<()> + Send>;
type TeardownHook = Arc<dyn Fn(&RxError) + Send + Sync>;

static TEARDOWN_HOOK: RwLock<Option<TeardownHook>> = parking_lot::const_rwlock(None);

/// Install a process-wide hook receiving every swallowed teardown failure.
///
/// Disposal never propagates failures; they are logged at `warn` and, if a
/// hook is installed, handed to it.
pub fn set_teardown_error_hook<F>(hook: F)
where
    F: Fn(&RxError) + Send + Sync + 'static,
{
    *TEARDOWN_HOOK.write() = Some(Arc::new(hook));
}

/// Remove the hook installed by [`set_teardown_error_hook`]
pub fn clear_teardown_error_hook() {
    *TEARDOWN_HOOK.write() = None;
}

fn report_teardown_error(err: &RxError) {
    warn!(error = %err, "teardown failed during disposal");
    let hook = TEARDOWN_HOOK.read().clone();
    if let Some(hook) = hook {
        hook(err);
    }
}

/// Cleanup action registered by a producer, run at most once
#[must_use = "a teardown does nothing unless returned from a producer or added to a subscriber"]
pub struct Teardown {
    action: Option<TeardownFn>,
}

impl Teardown {
    /// No cleanup required
    pub fn none() -> Self {
        Self { action: None }
    }

    /// Cleanup that cannot fail
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::fallible(move || {
            action();
            Ok(())
        })
    }

    /// Cleanup that may fail; the failure is reported, never propagated
    pub fn fallible<F>(action: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            action: Some(Box::new(action)),
        }
    }

    pub(crate) fn run(self) {
        let Some(action) = self.action else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(action)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => report_teardown_error(&err),
            Err(payload) => {
                let cause = RxError::from_panic(payload);
                report_teardown_error(&RxError::Teardown(cause.to_string()));
            }
        }
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Self::new(move || subscription.dispose())
    }
}

/// Subscription handle - similar to an RxJS Subscription
///
/// Owns the emission channel of one execution. Disposal detaches the
/// observer and runs the producer's teardown exactly once. Dropping the
/// handle disposes it.
#[must_use = "dropping a Subscription disposes it immediately"]
pub struct Subscription {
    channel: Option<Arc<dyn Lifecycle>>,
}

impl Subscription {
    pub(crate) fn new(channel: Arc<dyn Lifecycle>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// An already-closed subscription
    pub fn empty() -> Self {
        Self { channel: None }
    }

    /// Stop delivery and run teardown. Safe to call any number of times.
    pub fn dispose(&self) {
        if let Some(channel) = &self.channel {
            channel.dispose();
        }
    }

    /// Alias of [`Subscription::dispose`] matching RxJS naming
    pub fn unsubscribe(&self) {
        self.dispose();
    }

    /// Whether the subscription completed, errored, or was disposed
    pub fn is_closed(&self) -> bool {
        self.channel.as_ref().is_none_or(|channel| channel.is_closed())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Owner scope exit counts as disposal
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
