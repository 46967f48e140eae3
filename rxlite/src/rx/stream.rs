//! Bridge from a subscription to a `futures::Stream`

use super::{Observable, Observer, Subscription};
use crate::error::RxError;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Stream of the events of one subscription
///
/// Ends after completion or after yielding the error. Dropping the stream
/// disposes the underlying subscription.
pub struct ObservableStream<T> {
    receiver: mpsc::UnboundedReceiver<Result<T, RxError>>,
    subscription: Subscription,
}

impl<T: Send + 'static> ObservableStream<T> {
    pub(crate) fn subscribe(observable: &Observable<T>) -> Self {
        let (tx, receiver) = mpsc::unbounded_channel();
        let error_tx = tx.clone();
        // Completion drops the observer and with it every sender,
        // which closes the receiver.
        let subscription = observable.subscribe(
            Observer::on_next(move |value| {
                let _ = tx.send(Ok(value));
            })
            .with_error(move |err| {
                let _ = error_tx.send(Err(err));
            }),
        );
        Self {
            receiver,
            subscription,
        }
    }

    /// Dispose the subscription; values already received are still yielded
    pub fn dispose(&self) {
        self.subscription.dispose();
    }
}

impl<T> Stream for ObservableStream<T> {
    type Item = Result<T, RxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
