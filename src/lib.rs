//! # pushstream: push-based streams with a strict subscription lifecycle
//!
//! An [`Observable`] wraps a producer function. Subscribing runs the producer
//! once, hands it a [`StreamObserver`], and returns a [`Subscription`] that
//! guarantees:
//!
//! - values reach the consumer in the order they were delivered;
//! - exactly one of `error` or `complete` ends the stream, never followed by
//!   anything else;
//! - the producer's cleanup runs exactly once, whichever way the
//!   subscription closed.
//!
//! ## Quick Start
//!
//! ```rust
//! use pushstream::prelude::*;
//!
//! let queue = LocalQueue::new();
//! let rt = Runtime::builder().scheduler(queue.clone()).build();
//!
//! rt.of::<_, ()>(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe_next(|v| println!("Value: {}", v));
//!
//! // Collection sources emit from the deferral queue.
//! queue.run_pending();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Runtime`] | Deferral queue, fault sink and early-delivery policy |
//! | [`Observable`] | Immutable wrapper around a producer function |
//! | [`StreamObserver`] | What the producer delivers through |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Fault`] | An error with no consumer left to receive it |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): lets a `futures` `LocalSpawner` act
//!   as the deferral queue
//!
//! [`Runtime`]: runtime::Runtime
//! [`Observable`]: observable::Observable
//! [`StreamObserver`]: subscription::StreamObserver
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Fault`]: fault::Fault

pub mod error;
pub mod fault;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod runtime;
pub mod scheduler;
pub mod subscription;

#[cfg(test)]
mod test_util;

pub use prelude::*;

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
