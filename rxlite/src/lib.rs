//! # rxlite
//!
//! A small reactive stream core: typed, push-based, cold Observables with
//! guarded delivery and resource-safe teardown.
//!
//! ## Features
//!
//! - **Observable**: lazy producer, replayed independently per subscription
//! - **Emission guard**: nothing is delivered after completion, error or disposal
//! - **Subscription**: idempotent disposal, teardown run exactly once
//! - **catch_error**: the recovery primitive (`map` and `retry` built alongside)
//! - **Adapters**: event sources, promises, tokio futures, schedulers, `Stream`
//!
//! ## Quick Start
//!
//! ```rust
//! use rxlite::rx::{Observable, Observer};
//! use rxlite::RxError;
//!
//! let numbers = Observable::from_array(vec![33, 44, 55, 66, 77]);
//! let _sub = numbers.subscribe(
//!     Observer::on_next(|v: i32| println!("{v}"))
//!         .with_error(|err| eprintln!("{err}"))
//!         .with_complete(|| println!("completed")),
//! );
//!
//! let recovered = Observable::<String>::fail(RxError::msg("Error"))
//!     .catch_error(|err| Observable::of(err.to_string()));
//! let _sub = recovered.subscribe_next(|v| println!("{v}"));
//! ```

pub mod error;
pub mod rx;

pub use error::{Result, RxError};
pub use rx::{Observable, Observer, Subscriber, Subscription, Teardown};
