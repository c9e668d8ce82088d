//! IntoStream operator implementation
//!
//! Converts an observable into a `futures_core::Stream` so it can be consumed
//! with `while let` loops and the rest of the async ecosystem. Values are
//! queued as they arrive and handed out on poll:
//!
//! - `Ok(T)` for every value
//! - `Err(E)` once, when the observable fails
//! - `None` (end of stream) after completion, after the error, or once the
//!   subscription closed for any other reason
//!
//! ```rust
//! use futures::{executor::LocalPool, StreamExt};
//! use pushstream::prelude::*;
//!
//! let mut pool = LocalPool::new();
//! let rt = Runtime::builder().scheduler(pool.spawner()).build();
//!
//! let mut stream = rt.of::<_, ()>([1, 2, 3]).into_stream();
//! pool.run_until(async move {
//!   while let Some(Ok(value)) = stream.next().await {
//!     println!("Received: {value}");
//!   }
//! });
//! ```

use std::{
  cell::RefCell,
  collections::VecDeque,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

use futures_core::stream::Stream;

use crate::{
  observable::Observable,
  observer::Observer,
  subscription::SubscriptionGuard,
};

struct IntoStreamState<T, E> {
  queue: VecDeque<Result<T, E>>,
  waker: Option<Waker>,
  is_closed: bool,
}

type Shared<T, E> = Rc<RefCell<IntoStreamState<T, E>>>;

/// Queues `item`, optionally marks the stream finished, and wakes the task
/// polling it. The waker runs after the borrow is released.
fn push<T, E>(shared: &Shared<T, E>, item: Option<Result<T, E>>, close: bool) {
  let waker = {
    let mut state = shared.borrow_mut();
    if state.is_closed {
      return;
    }
    state.queue.extend(item);
    state.is_closed = close;
    state.waker.take()
  };
  if let Some(waker) = waker {
    waker.wake();
  }
}

pub(crate) fn into_stream<T, E>(source: &Observable<T, E>) -> IntoStream<T, E>
where
  T: 'static,
  E: 'static,
{
  let shared = Rc::new(RefCell::new(IntoStreamState {
    queue: VecDeque::new(),
    waker: None,
    is_closed: false,
  }));
  let subscription = source.subscribe(IntoStreamObserver { shared: shared.clone() });
  IntoStream { shared, _guard: subscription.unsubscribe_when_dropped() }
}

// ============================================================================
// IntoStream
// ============================================================================

/// A `Stream` yielding the values of an observable as `Result<T, E>`.
///
/// Created by [`ObservableExt::into_stream`](crate::ops::ObservableExt::into_stream).
/// Dropping it unsubscribes.
#[must_use = "streams do nothing unless polled, and dropping one unsubscribes"]
pub struct IntoStream<T, E> {
  shared: Shared<T, E>,
  _guard: SubscriptionGuard,
}

impl<T, E> Stream for IntoStream<T, E> {
  type Item = Result<T, E>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let mut state = self.shared.borrow_mut();
    if let Some(item) = state.queue.pop_front() {
      return Poll::Ready(Some(item));
    }
    if state.is_closed {
      return Poll::Ready(None);
    }
    state.waker = Some(cx.waker().clone());
    Poll::Pending
  }
}

// ============================================================================
// IntoStreamObserver
// ============================================================================

struct IntoStreamObserver<T, E> {
  shared: Shared<T, E>,
}

impl<T, E> Observer<T, E> for IntoStreamObserver<T, E> {
  fn next(&mut self, value: T) { push(&self.shared, Some(Ok(value)), false) }

  fn error(&mut self, err: E) -> Result<(), E> {
    push(&self.shared, Some(Err(err)), true);
    Ok(())
  }

  fn complete(&mut self) { push(&self.shared, None, true) }
}

/// The subscription lets go of its observer once it closes, however that
/// happened.
impl<T, E> Drop for IntoStreamObserver<T, E> {
  fn drop(&mut self) { push(&self.shared, None, true) }
}
