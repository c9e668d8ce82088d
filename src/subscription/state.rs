//! Subscription state machine
//!
//! | state          | delivery                                  |
//! |----------------|-------------------------------------------|
//! | `Initializing` | rejected with `NotReady`, or buffered     |
//! | `Buffering`    | queued behind the pending flush           |
//! | `Ready`        | dispatched to the consumer                |
//! | `Running`      | rejected with `Reentrant`                 |
//! | `Closed`       | ignored                                   |
//!
//! The consumer is moved out of the shared cell for the duration of every
//! callback. No `RefCell` borrow is held while user code runs, so a callback
//! may freely unsubscribe, and a nested delivery finds the state `Running`.

use std::{
  cell::RefCell,
  collections::VecDeque,
  fmt,
  panic::{self, AssertUnwindSafe},
  rc::Rc,
};

use super::{Lifecycle, Subscription, Teardown};
use crate::{
  error::Error,
  fault::Fault,
  observer::BoxedObserver,
  runtime::{EarlyDelivery, Runtime},
};

/// Producer function as stored by an observable, with its cleanup normalised.
pub(crate) type Producer<T, E> = dyn Fn(StreamObserver<T, E>) -> Result<Teardown, E>;

/// Lifecycle state of a subscription. Once `Closed`, it never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
  /// The producer function has not returned yet.
  Initializing,
  /// Deliveries are queued and a flush is pending on the deferral queue.
  Buffering,
  Ready,
  /// A consumer callback is executing.
  Running,
  Closed,
}

enum Signal<T, E> {
  Next(T),
  Error(E),
  Complete,
}

struct Inner<T, E> {
  state: SubscriptionState,
  observer: Option<BoxedObserver<T, E>>,
  cleanup: Teardown,
  buffer: VecDeque<Signal<T, E>>,
}

/// What is left to release after a subscription closed.
struct Closing<T, E> {
  observer: Option<BoxedObserver<T, E>>,
  cleanup: Teardown,
  buffer: VecDeque<Signal<T, E>>,
}

impl<T, E> Inner<T, E> {
  fn close(&mut self) -> Closing<T, E> {
    tracing::trace!(from = ?self.state, "subscription closed");
    self.state = SubscriptionState::Closed;
    Closing {
      observer: self.observer.take(),
      cleanup: self.cleanup.take(),
      buffer: std::mem::take(&mut self.buffer),
    }
  }
}

struct Core<T, E> {
  inner: RefCell<Inner<T, E>>,
  runtime: Runtime,
}

/// Starts a subscription: arms the consumer, runs the producer function once
/// and records its cleanup.
pub(crate) fn start<T: 'static, E: 'static>(
  runtime: &Runtime, producer: &Producer<T, E>, observer: BoxedObserver<T, E>,
) -> Subscription {
  let core = Rc::new(Core {
    inner: RefCell::new(Inner {
      state: SubscriptionState::Initializing,
      observer: Some(observer),
      cleanup: Teardown::none(),
      buffer: VecDeque::new(),
    }),
    runtime: runtime.clone(),
  });
  let subscription = Subscription::new(core.clone());

  core.call_start(&subscription);
  if core.state() == SubscriptionState::Closed {
    return subscription;
  }

  let stream_observer = StreamObserver(core.clone());
  match panic::catch_unwind(AssertUnwindSafe(|| producer(stream_observer))) {
    Ok(Ok(teardown)) => core.armed(teardown),
    Ok(Err(err)) => core.failed(err),
    Err(payload) => {
      core.runtime.report(Fault::Panic(payload));
      core.abort();
    }
  }
  subscription
}

impl<T: 'static, E: 'static> Core<T, E> {
  fn state(&self) -> SubscriptionState { self.inner.borrow().state }

  fn call_start(&self, subscription: &Subscription) {
    let Some(mut observer) = self.inner.borrow_mut().observer.take() else { return };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.start(subscription)));
    self.restore(observer);
    if let Err(payload) = outcome {
      self.runtime.report(Fault::Panic(payload));
    }
  }

  /// Puts the consumer back after a callback, unless the subscription closed
  /// meanwhile.
  fn restore(&self, observer: BoxedObserver<T, E>) {
    let mut inner = self.inner.borrow_mut();
    if inner.state == SubscriptionState::Closed {
      drop(inner);
      drop(observer);
      return;
    }
    if inner.state == SubscriptionState::Running {
      inner.state = SubscriptionState::Ready;
    }
    inner.observer = Some(observer);
  }

  /// The producer function returned normally.
  fn armed(&self, teardown: Teardown) {
    let mut inner = self.inner.borrow_mut();
    match inner.state {
      SubscriptionState::Closed => {
        drop(inner);
        teardown.run(&self.runtime);
      }
      SubscriptionState::Initializing => {
        tracing::trace!("subscription ready");
        inner.state = SubscriptionState::Ready;
        inner.cleanup = teardown;
      }
      _ => inner.cleanup = teardown,
    }
  }

  /// The producer function failed: its error is delivered from the deferral
  /// queue, behind anything already buffered.
  fn failed(self: &Rc<Self>, err: E) {
    let mut inner = self.inner.borrow_mut();
    match inner.state {
      SubscriptionState::Closed => {
        drop(inner);
        self.runtime.report(Fault::unhandled(err));
      }
      SubscriptionState::Buffering => inner.buffer.push_back(Signal::Error(err)),
      _ => {
        inner.buffer.push_back(Signal::Error(err));
        inner.state = SubscriptionState::Buffering;
        drop(inner);
        self.schedule_flush();
      }
    }
  }

  /// The producer panicked: close, let the consumer know, then clean up.
  /// Anything still buffered is dropped.
  fn abort(&self) {
    let mut inner = self.inner.borrow_mut();
    if inner.state == SubscriptionState::Closed {
      return;
    }
    let Closing { observer, cleanup, buffer } = inner.close();
    drop(inner);
    drop(buffer);
    if let Some(mut observer) = observer {
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| observer.aborted())) {
        self.runtime.report(Fault::Panic(payload));
      }
    }
    cleanup.run(&self.runtime);
  }

  fn schedule_flush(self: &Rc<Self>) {
    tracing::trace!("subscription buffering, flush scheduled");
    let core = self.clone();
    self.runtime.defer(Box::new(move || core.flush()));
  }

  fn flush(self: &Rc<Self>) {
    let pending = {
      let mut inner = self.inner.borrow_mut();
      if inner.state != SubscriptionState::Buffering {
        return;
      }
      inner.state = SubscriptionState::Ready;
      std::mem::take(&mut inner.buffer)
    };
    for signal in pending {
      if self.state() == SubscriptionState::Closed {
        break;
      }
      if let Err(err) = self.deliver(signal) {
        self.runtime.report(Fault::Usage(err));
      }
    }
  }

  fn deliver(self: &Rc<Self>, signal: Signal<T, E>) -> Result<(), Error> {
    let mut inner = self.inner.borrow_mut();
    match inner.state {
      SubscriptionState::Closed => return Ok(()),
      SubscriptionState::Running => {
        tracing::debug!(fault = Error::Reentrant.as_label(), "rejected delivery");
        return Err(Error::Reentrant);
      }
      SubscriptionState::Initializing => match self.runtime.early_delivery() {
        EarlyDelivery::Reject => {
          tracing::debug!(fault = Error::NotReady.as_label(), "rejected delivery");
          return Err(Error::NotReady);
        }
        EarlyDelivery::Buffer => {
          inner.buffer.push_back(signal);
          inner.state = SubscriptionState::Buffering;
          drop(inner);
          self.schedule_flush();
          return Ok(());
        }
      },
      SubscriptionState::Buffering => {
        inner.buffer.push_back(signal);
        return Ok(());
      }
      SubscriptionState::Ready => {}
    }

    match signal {
      Signal::Next(value) => {
        let Some(mut observer) = inner.observer.take() else { return Ok(()) };
        inner.state = SubscriptionState::Running;
        drop(inner);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.next(value)));
        self.restore(observer);
        if let Err(payload) = outcome {
          self.runtime.report(Fault::Panic(payload));
        }
      }
      Signal::Error(err) => {
        let closing = inner.close();
        drop(inner);
        match closing.observer {
          Some(mut observer) => {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.error(err))) {
              Ok(Ok(())) => {}
              Ok(Err(err)) => self.runtime.report(Fault::unhandled(err)),
              Err(payload) => self.runtime.report(Fault::Panic(payload)),
            }
          }
          None => self.runtime.report(Fault::unhandled(err)),
        }
        closing.cleanup.run(&self.runtime);
      }
      Signal::Complete => {
        let closing = inner.close();
        drop(inner);
        if let Some(mut observer) = closing.observer {
          if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| observer.complete())) {
            self.runtime.report(Fault::Panic(payload));
          }
        }
        closing.cleanup.run(&self.runtime);
      }
    }
    Ok(())
  }
}

impl<T, E> Lifecycle for Core<T, E> {
  fn cancel(&self) {
    let mut inner = self.inner.borrow_mut();
    if inner.state == SubscriptionState::Closed {
      return;
    }
    let Closing { observer, cleanup, buffer } = inner.close();
    drop(inner);
    drop(observer);
    drop(buffer);
    cleanup.run(&self.runtime);
  }

  fn is_closed(&self) -> bool { self.inner.borrow().state == SubscriptionState::Closed }
}

// ============================================================================
// StreamObserver
// ============================================================================

/// The facade a producer function delivers through.
///
/// Every call goes through the subscription's state machine:
///
/// - after the subscription closed, deliveries are silently ignored;
/// - while a consumer callback is running, a nested delivery fails with
///   [`Error::Reentrant`];
/// - while the producer function itself is still running, deliveries fail
///   with [`Error::NotReady`] unless the runtime buffers them
///   ([`EarlyDelivery::Buffer`]).
///
/// Panics raised by consumer callbacks never reach the producer; they go to
/// the runtime's fault channel and the producer's loop keeps going.
pub struct StreamObserver<T, E>(Rc<Core<T, E>>);

impl<T, E> Clone for StreamObserver<T, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: 'static, E: 'static> StreamObserver<T, E> {
  #[inline]
  pub fn next(&self, value: T) -> Result<(), Error> { self.0.deliver(Signal::Next(value)) }

  #[inline]
  pub fn error(&self, err: E) -> Result<(), Error> { self.0.deliver(Signal::Error(err)) }

  #[inline]
  pub fn complete(&self) -> Result<(), Error> { self.0.deliver(Signal::Complete) }

  /// `true` once the subscription is closed; well behaved producers stop
  /// emitting when they see it.
  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }

  #[inline]
  pub fn state(&self) -> SubscriptionState { self.0.state() }

  /// A handle to the subscription this observer drives.
  pub fn subscription(&self) -> Subscription { Subscription::new(self.0.clone()) }

  pub fn runtime(&self) -> &Runtime { &self.0.runtime }

  /// Delivers from library code that has nobody to return a usage fault to.
  pub(crate) fn forward_next(&self, value: T) { self.forward(Signal::Next(value)) }

  pub(crate) fn forward_error(&self, err: E) { self.forward(Signal::Error(err)) }

  pub(crate) fn forward_complete(&self) { self.forward(Signal::Complete) }

  /// Closes the subscription as if its own producer had panicked.
  pub(crate) fn abort(&self) { self.0.abort() }

  fn forward(&self, signal: Signal<T, E>) {
    if let Err(err) = self.0.deliver(signal) {
      self.0.runtime.report(Fault::Usage(err));
    }
  }
}

impl<T, E> fmt::Debug for StreamObserver<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StreamObserver").field("state", &self.0.inner.borrow().state).finish()
  }
}
