//! ForEach operator implementation
//!
//! Subscribes at once and exposes the outcome of the subscription as a
//! [`Future`]:
//!
//! - **Completion**: resolves with `Ok(())`
//! - **Error from observable**: resolves with `Err(error)`
//! - **Failing callback**: resolves with the callback's error and
//!   unsubscribes
//! - **Subscription closed without terminating**: resolves with
//!   [`Error::Interrupted`]
//!
//! Dropping the future unsubscribes.
//!
//! ```rust
//! use futures::executor::LocalPool;
//! use pushstream::prelude::*;
//!
//! let mut pool = LocalPool::new();
//! let rt = Runtime::builder().scheduler(pool.spawner()).build();
//!
//! let mut sum = 0;
//! let done = rt.of::<_, Error>([1, 2, 3]).for_each(move |v| {
//!   sum += v;
//!   println!("running total {sum}");
//! });
//! assert_eq!(pool.run_until(done), Ok(()));
//! ```

use std::{
  cell::RefCell,
  future::Future,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

use crate::{
  error::Error,
  observable::Observable,
  observer::Observer,
  subscription::{Subscription, SubscriptionGuard},
};

/// Shared state between Future and Observer
struct SharedState<E> {
  result: Option<Result<(), E>>,
  waker: Option<Waker>,
}

type Shared<E> = Rc<RefCell<SharedState<E>>>;

pub(crate) fn for_each<T, E, F>(source: &Observable<T, E>, f: F) -> ForEach<E>
where
  T: 'static,
  E: From<Error> + 'static,
  F: FnMut(T) -> Result<(), E> + 'static,
{
  let shared = Rc::new(RefCell::new(SharedState { result: None, waker: None }));
  let observer =
    ForEachObserver { f, shared: shared.clone(), subscription: None, settled: false };
  let subscription = source.subscribe(observer);
  ForEach { shared, _guard: subscription.unsubscribe_when_dropped() }
}

// ============================================================================
// ForEach future
// ============================================================================

/// A future that resolves when the subscription behind it terminates.
#[must_use = "dropping a ForEach unsubscribes"]
pub struct ForEach<E> {
  shared: Shared<E>,
  _guard: SubscriptionGuard,
}

impl<E> Future for ForEach<E> {
  type Output = Result<(), E>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut shared = self.shared.borrow_mut();
    match shared.result.take() {
      Some(result) => Poll::Ready(result),
      None => {
        shared.waker = Some(cx.waker().clone());
        Poll::Pending
      }
    }
  }
}

// ============================================================================
// ForEachObserver
// ============================================================================

struct ForEachObserver<F, E: From<Error>> {
  f: F,
  shared: Shared<E>,
  subscription: Option<Subscription>,
  settled: bool,
}

impl<F, E: From<Error>> ForEachObserver<F, E> {
  fn settle(&mut self, result: Result<(), E>) {
    if std::mem::replace(&mut self.settled, true) {
      return;
    }
    let waker = {
      let mut shared = self.shared.borrow_mut();
      shared.result = Some(result);
      shared.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<T, E, F> Observer<T, E> for ForEachObserver<F, E>
where
  E: From<Error>,
  F: FnMut(T) -> Result<(), E>,
{
  fn start(&mut self, subscription: &Subscription) {
    self.subscription = Some(subscription.clone());
  }

  fn next(&mut self, value: T) {
    if self.settled {
      return;
    }
    if let Err(err) = (self.f)(value) {
      self.settle(Err(err));
      if let Some(subscription) = self.subscription.take() {
        subscription.unsubscribe();
      }
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.settle(Err(err));
    Ok(())
  }

  fn complete(&mut self) { self.settle(Ok(())) }
}

impl<F, E: From<Error>> Drop for ForEachObserver<F, E> {
  fn drop(&mut self) {
    if !self.settled {
      tracing::debug!("for_each subscription closed before it terminated");
      self.settle(Err(Error::Interrupted.into()));
    }
  }
}
