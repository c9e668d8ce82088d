//! Observable: an immutable wrapper around a producer function
//!
//! An [`Observable`] does nothing until it is subscribed. Every call to
//! [`subscribe`](Observable::subscribe) starts a fresh
//! [`Subscription`](crate::subscription::Subscription) and runs the producer
//! function exactly once for it.
//!
//! Observables are created through a [`Runtime`](crate::runtime::Runtime):
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use pushstream::prelude::*;
//!
//! let queue = LocalQueue::new();
//! let rt = Runtime::builder().scheduler(queue.clone()).build();
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! rt.of::<_, ()>([1, 2, 3]).map(|v| v * 2).subscribe_next(move |v| c_seen.borrow_mut().push(v));
//!
//! queue.run_pending();
//! assert_eq!(*seen.borrow(), vec![2, 4, 6]);
//! ```

use std::{fmt, rc::Rc};

use crate::{
  observer::{Callbacks, FnMutObserver, Observer},
  runtime::Runtime,
  subscription::{self, Producer, StreamObserver, Subscription, Teardown},
};

mod from;
mod from_iter;

pub use from::IntoObservable;
pub use from_iter::Iterable;

/// A push-based stream of `T` values that may fail with `E`.
///
/// Clones share the producer function; they are the same observable.
pub struct Observable<T, E> {
  producer: Rc<Producer<T, E>>,
  runtime: Runtime,
}

impl<T, E> Clone for Observable<T, E> {
  fn clone(&self) -> Self { Self { producer: self.producer.clone(), runtime: self.runtime.clone() } }
}

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Wraps `producer`.
  ///
  /// The producer receives the [`StreamObserver`] of each new subscription
  /// and returns its cleanup: `()`, a [`Cleanup`](crate::subscription::Cleanup),
  /// an `Option<Cleanup>` or a [`Subscription`] to cancel. Returning `Err` is
  /// the same as delivering that error, except that it is delivered from the
  /// deferral queue.
  ///
  /// Deliveries made before the producer returns are rejected with
  /// [`Error::NotReady`](crate::error::Error::NotReady) unless the runtime is
  /// configured with [`EarlyDelivery::Buffer`](crate::runtime::EarlyDelivery).
  pub fn new<F, R>(runtime: &Runtime, producer: F) -> Self
  where
    F: Fn(StreamObserver<T, E>) -> Result<R, E> + 'static,
    R: Into<Teardown>,
  {
    let producer: Rc<Producer<T, E>> = Rc::new(move |observer| producer(observer).map(Into::into));
    Observable { producer, runtime: runtime.clone() }
  }

  #[inline]
  pub fn runtime(&self) -> &Runtime { &self.runtime }

  /// Starts a subscription delivering to `observer`.
  pub fn subscribe(&self, observer: impl Observer<T, E> + 'static) -> Subscription {
    subscription::start(&self.runtime, &*self.producer, Box::new(observer))
  }

  /// Subscribes with a closure receiving each value. Errors are unhandled and
  /// go to the fault channel.
  pub fn subscribe_next(&self, next: impl FnMut(T) + 'static) -> Subscription {
    self.subscribe(FnMutObserver(next))
  }

  /// Subscribes with the positional `(next, error, complete)` handlers.
  pub fn observe(
    &self, next: impl FnMut(T) + 'static, error: impl FnMut(E) + 'static,
    complete: impl FnMut() + 'static,
  ) -> Subscription {
    self.subscribe(Callbacks::positional(next, error, complete))
  }
}

impl<T, E> fmt::Debug for Observable<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Observable").field("runtime", &self.runtime).finish_non_exhaustive()
  }
}

// ============================================================================
// Species
// ============================================================================

/// Chooses the type that operators build their results as.
///
/// Every operator in [`ObservableExt`](crate::ops::ObservableExt) reads its
/// source through [`observable`](Species::observable) and wraps its result
/// with [`species`](Species::species). `Observable` is its own species; a
/// wrapper type that implements `Species` gets the wrapper back from every
/// operator.
///
/// ```rust
/// use pushstream::prelude::*;
///
/// #[derive(Clone)]
/// struct Traced<T, E>(Observable<T, E>);
///
/// impl<T: 'static, E: 'static> Species<T, E> for Traced<T, E> {
///   type With<U: 'static, F: 'static> = Traced<U, F>;
///
///   fn observable(&self) -> &Observable<T, E> { &self.0 }
///
///   fn species<U: 'static, F: 'static>(&self, source: Observable<U, F>) -> Traced<U, F> {
///     Traced(source)
///   }
/// }
///
/// let rt = Runtime::new();
/// let traced: Traced<i32, ()> = Traced(rt.of([1, 2]));
/// let doubled: Traced<i32, ()> = traced.map(|v| v * 2);
/// # let _ = doubled;
/// ```
pub trait Species<T, E>: Sized {
  type With<U: 'static, F: 'static>: Species<U, F>;

  fn observable(&self) -> &Observable<T, E>;

  fn species<U: 'static, F: 'static>(&self, source: Observable<U, F>) -> Self::With<U, F>;
}

impl<T: 'static, E: 'static> Species<T, E> for Observable<T, E> {
  type With<U: 'static, F: 'static> = Observable<U, F>;

  #[inline]
  fn observable(&self) -> &Observable<T, E> { self }

  #[inline]
  fn species<U: 'static, F: 'static>(&self, source: Observable<U, F>) -> Observable<U, F> { source }
}

// ============================================================================
// Runtime constructors
// ============================================================================

impl Runtime {
  /// Emits `items` in order from the deferral queue, then completes.
  pub fn of<T, E>(&self, items: impl IntoIterator<Item = T>) -> Observable<T, E>
  where
    T: Clone + 'static,
    E: 'static,
  {
    from_iter::from_iter(self, items.into_iter().collect::<Vec<_>>())
  }

  /// Emits every item of `iterable` from the deferral queue, then completes.
  /// Each subscription iterates its own clone.
  pub fn from_iter<I, E>(&self, iterable: I) -> Observable<I::Item, E>
  where
    I: IntoIterator + Clone + 'static,
    I::Item: 'static,
    E: 'static,
  {
    from_iter::from_iter(self, iterable)
  }

  /// Converts anything implementing [`IntoObservable`] into an observable on
  /// this runtime.
  pub fn from<T, E>(&self, source: impl IntoObservable<T, E>) -> Observable<T, E> {
    source.into_observable(self)
  }

  /// Completes from the deferral queue without emitting.
  pub fn empty<T: 'static, E: 'static>(&self) -> Observable<T, E> {
    self.create(|observer: StreamObserver<T, E>| {
      let emitter = observer.clone();
      observer.runtime().defer(Box::new(move || emitter.forward_complete()));
      Ok(())
    })
  }
}
