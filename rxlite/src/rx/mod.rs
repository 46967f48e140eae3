//! RxJS-style reactive programming for Rust
//!
//! Cold Observables, guarded delivery and resource-safe teardown, plus
//! adapters for event sources, promises, futures and schedulers.

mod channel;
pub mod event;
pub mod observable;
pub mod observer;
pub mod operators;
pub mod promise;
pub mod scheduler;
pub mod stream;
pub mod subscription;

pub use channel::Subscriber;
pub use event::{EventSource, EventTarget, Listener, ListenerId, from_event};
pub use observable::Observable;
pub use observer::Observer;
pub use promise::{IsWanted, Promise, PromiseLike, Resolver, from_future, from_promise};
pub use scheduler::{
    ScheduledTask, Scheduler, SchedulerRef, TokioScheduler, VirtualScheduler, interval, timer,
};
pub use stream::ObservableStream;
pub use subscription::{
    Subscription, Teardown, clear_teardown_error_hook, set_teardown_error_hook,
};

// Re-export the composition primitives
pub use operators::{catch_error, map, retry};
