use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  observable::{IntoObservable, Observable},
  observer::Observer,
  runtime::Runtime,
  subscription::{Cleanup, DynamicSubscriptions, StreamObserver, Subscription},
};

impl Runtime {
  /// Combines observables into one by merging their emissions.
  ///
  /// # Example
  ///
  /// ```
  /// use pushstream::prelude::*;
  ///
  /// let queue = LocalQueue::new();
  /// let rt = Runtime::builder().scheduler(queue.clone()).build();
  /// let numbers = rt.of::<_, ()>(0..10);
  /// let even = numbers.clone().filter(|v| v % 2 == 0);
  /// let odd = numbers.filter(|v| v % 2 != 0);
  ///
  /// rt.merge([even, odd]).subscribe_next(|v| println!("{v} "));
  /// queue.run_pending();
  /// ```
  pub fn merge<T, E, I>(&self, sources: I) -> Observable<T, E>
  where
    T: 'static,
    E: 'static,
    I: IntoIterator,
    I::Item: IntoObservable<T, E>,
  {
    let sources = sources.into_iter().map(|s| s.into_observable(self)).collect();
    merge(self, sources)
  }
}

/// Interleaves `sources`; completes once all of them completed, fails with
/// the first error. No sources at all completes from the deferral queue.
pub(crate) fn merge<T: 'static, E: 'static>(
  runtime: &Runtime, sources: Vec<Observable<T, E>>,
) -> Observable<T, E> {
  if sources.is_empty() {
    return runtime.empty();
  }
  let sources = Rc::new(sources);
  runtime.create(move |down: StreamObserver<T, E>| {
    let subscriptions = Rc::new(RefCell::new(DynamicSubscriptions::new()));
    let remaining = Rc::new(Cell::new(sources.len()));
    for source in sources.iter() {
      if down.is_closed() {
        break;
      }
      let subscription =
        source.subscribe(MergeObserver { down: down.clone(), remaining: remaining.clone() });
      subscriptions.borrow_mut().add(subscription);
    }
    Ok(Cleanup::action(move || cancel_all(&subscriptions)))
  })
}

pub(crate) fn cancel_all(subscriptions: &RefCell<DynamicSubscriptions<Subscription>>) {
  let active = subscriptions.borrow_mut().take_all();
  for subscription in active {
    subscription.unsubscribe();
  }
}

struct MergeObserver<T, E> {
  down: StreamObserver<T, E>,
  remaining: Rc<Cell<usize>>,
}

impl<T: 'static, E: 'static> Observer<T, E> for MergeObserver<T, E> {
  fn next(&mut self, value: T) { self.down.forward_next(value) }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    let remaining = self.remaining.get() - 1;
    self.remaining.set(remaining);
    if remaining == 0 {
      self.down.forward_complete();
    }
  }
  fn aborted(&mut self) { self.down.abort() }
}
