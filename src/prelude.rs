//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  error::Error,
  fault::{Fault, FaultSink},
  observable::{IntoObservable, Iterable, Observable, Species},
  observer::{Callbacks, FnMutObserver, Observer},
  ops::{ForEach, IntoStream, ObservableExt},
  runtime::{EarlyDelivery, Runtime, RuntimeBuilder},
  scheduler::{Job, LocalQueue, Scheduler},
  subscription::{
    Cleanup, StreamObserver, Subscription, SubscriptionGuard, SubscriptionState, Teardown,
  },
};
