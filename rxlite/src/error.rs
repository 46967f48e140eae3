//! Error types for rxlite

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for rxlite operations
pub type Result<T> = std::result::Result<T, RxError>;

/// Error payload carried on the error path of a subscription.
///
/// Cloneable so that a single failure can be handed to several consumers
/// (a `catch_error` handler, a settled promise with many subscribers, a
/// diagnostic hook).
#[derive(Error, Debug, Clone)]
pub enum RxError {
    /// Producer signalled a failure
    #[error("producer failed: {0}")]
    Producer(String),

    /// Producer panicked while subscribing or while running on a task
    #[error("producer panicked: {0}")]
    Panicked(String),

    /// Deferred computation rejected
    #[error("promise rejected: {0}")]
    Rejected(String),

    /// Resolver dropped without settling the promise
    #[error("promise abandoned before settling")]
    Abandoned,

    /// Teardown action failed during disposal
    #[error("teardown failed: {0}")]
    Teardown(String),

    /// No async runtime to run on
    #[error("no async runtime available: {0}")]
    NoRuntime(String),

    /// Arbitrary error raised by user code
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl RxError {
    /// Shorthand for [`RxError::Producer`]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Producer(message.into())
    }

    /// Wrap any error type, keeping it inspectable via [`RxError::downcast_ref`]
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Arc::new(err))
    }

    /// Borrow the wrapped error if this is [`RxError::Other`] holding an `E`
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Other(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Build a [`RxError::Panicked`] from a `catch_unwind` payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}
