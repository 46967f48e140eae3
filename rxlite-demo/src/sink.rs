//! Observers and drains that report every event through `tracing`

use futures::StreamExt;
use rxlite::{Observable, Observer};
use std::fmt::Debug;
use tracing::{info, warn};

/// Observer logging each event under `label`
pub fn log_observer<T: Debug + Send + 'static>(label: &'static str) -> Observer<T> {
    Observer::on_next(move |value: T| info!(stream = label, value = ?value, "next"))
        .with_error(move |err| warn!(stream = label, error = %err, "error"))
        .with_complete(move || info!(stream = label, "complete"))
}

/// Subscribe and log every event until the source terminates
pub async fn drain<T: Debug + Send + 'static>(label: &'static str, source: &Observable<T>) {
    let mut stream = source.into_stream();
    while let Some(item) = stream.next().await {
        match item {
            Ok(value) => info!(stream = label, value = ?value, "next"),
            Err(err) => {
                warn!(stream = label, error = %err, "error");
                return;
            }
        }
    }
    info!(stream = label, "complete");
}
