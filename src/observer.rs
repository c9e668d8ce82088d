//! Observer trait and implementations
//!
//! An [`Observer`] is the consumer side of a subscription: an optional set of
//! `start`, `next`, `error` and `complete` handlers. Every method has a
//! default, so leaving a handler out is legal. The one asymmetry is `error`:
//! its default hands the error back, and an error that comes back is raised on
//! the host fault channel instead of being dropped.
//!
//! `aborted` is not a terminal signal. It tells library observers that a
//! source died with its producer, so they can tear down what they built on
//! top of it.

use crate::subscription::Subscription;

// ============================================================================
// Observer Trait
// ============================================================================

pub trait Observer<T, E> {
  /// Called once, before the producer function runs, with the handle of the
  /// subscription being started. Unsubscribing here prevents the producer
  /// from running at all.
  fn start(&mut self, subscription: &Subscription) { let _ = subscription; }

  /// Receive the next value.
  fn next(&mut self, value: T) { let _ = value; }

  /// Receive the terminal error.
  ///
  /// Return `Err(err)` when the error is not handled; the subscription then
  /// reports it to the host fault channel.
  fn error(&mut self, err: E) -> Result<(), E> { Err(err) }

  /// Receive the terminal completion.
  fn complete(&mut self) {}

  /// The subscription closed because its producer panicked. Neither `error`
  /// nor `complete` follows, and the panic already went to the fault channel.
  fn aborted(&mut self) {}
}

impl<T, E, O: Observer<T, E> + ?Sized> Observer<T, E> for Box<O> {
  #[inline]
  fn start(&mut self, subscription: &Subscription) { (**self).start(subscription) }
  #[inline]
  fn next(&mut self, value: T) { (**self).next(value) }
  #[inline]
  fn error(&mut self, err: E) -> Result<(), E> { (**self).error(err) }
  #[inline]
  fn complete(&mut self) { (**self).complete() }
  #[inline]
  fn aborted(&mut self) { (**self).aborted() }
}

/// Boxed observer as stored by a subscription.
pub type BoxedObserver<T, E> = Box<dyn Observer<T, E>>;

// ============================================================================
// FnMutObserver - Closure adapter
// ============================================================================

/// Adapts a closure into an observer that only handles `next`.
///
/// Errors reaching it are unhandled and end up on the fault channel.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, T, E> Observer<T, E> for FnMutObserver<F>
where
  F: FnMut(T),
{
  #[inline]
  fn next(&mut self, value: T) { (self.0)(value) }
}

// ============================================================================
// Callbacks - optional handler set
// ============================================================================

type StartFn = Box<dyn FnMut(&Subscription)>;
type NextFn<T> = Box<dyn FnMut(T)>;
type ErrorFn<E> = Box<dyn FnMut(E)>;
type CompleteFn = Box<dyn FnMut()>;

/// An observer assembled from optional closures.
///
/// Each delivery checks whether its handler is present; an absent `next`,
/// `start` or `complete` is a no-op and an absent `error` leaves the error
/// unhandled.
///
/// ```rust
/// use pushstream::prelude::*;
///
/// let observer = Callbacks::<i32, String>::new()
///   .on_next(|v| println!("value {v}"))
///   .on_error(|e| eprintln!("failed: {e}"));
/// # let _ = observer;
/// ```
pub struct Callbacks<T, E> {
  start: Option<StartFn>,
  next: Option<NextFn<T>>,
  error: Option<ErrorFn<E>>,
  complete: Option<CompleteFn>,
}

impl<T, E> Default for Callbacks<T, E> {
  fn default() -> Self { Self { start: None, next: None, error: None, complete: None } }
}

impl<T, E> Callbacks<T, E> {
  pub fn new() -> Self { Self::default() }

  pub fn on_start(mut self, f: impl FnMut(&Subscription) + 'static) -> Self {
    self.start = Some(Box::new(f));
    self
  }

  pub fn on_next(mut self, f: impl FnMut(T) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnMut(E) + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }

  /// Normalises the positional `(next, error, complete)` form.
  pub fn positional(
    next: impl FnMut(T) + 'static, error: impl FnMut(E) + 'static, complete: impl FnMut() + 'static,
  ) -> Self {
    Self::new().on_next(next).on_error(error).on_complete(complete)
  }

  #[inline]
  pub fn handles_error(&self) -> bool { self.error.is_some() }
}

impl<T, E> Observer<T, E> for Callbacks<T, E> {
  fn start(&mut self, subscription: &Subscription) {
    if let Some(start) = &mut self.start {
      start(subscription);
    }
  }

  fn next(&mut self, value: T) {
    if let Some(next) = &mut self.next {
      next(value);
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    match &mut self.error {
      Some(error) => {
        error(err);
        Ok(())
      }
      None => Err(err),
    }
  }

  fn complete(&mut self) {
    if let Some(complete) = &mut self.complete {
      complete();
    }
  }
}

// ============================================================================
// Tests
// ============================================================================
