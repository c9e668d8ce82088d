use std::collections::VecDeque;

use super::{from_iter::from_iter, Iterable, Observable};
use crate::{observer::Observer, runtime::Runtime, subscription::StreamObserver};

/// Conversion into an [`Observable`] bound to a runtime.
///
/// This is the capability interop goes through: `flat_map`, `concat`,
/// `merge` and [`Runtime::from`] accept anything implementing it. A type that
/// implements neither this trait nor `Observable` cannot be passed to them at
/// all.
pub trait IntoObservable<T, E> {
  fn into_observable(self, runtime: &Runtime) -> Observable<T, E>;
}

impl<T: 'static, E: 'static> IntoObservable<T, E> for Observable<T, E> {
  /// Returned unchanged when it already belongs to `runtime`; otherwise it is
  /// wrapped so that the new subscriptions report to `runtime`.
  fn into_observable(self, runtime: &Runtime) -> Observable<T, E> {
    if self.runtime().same(runtime) {
      return self;
    }
    runtime.create(move |observer: StreamObserver<T, E>| Ok(self.subscribe(observer)))
  }
}

impl<T: Clone + 'static, E: 'static> IntoObservable<T, E> for Vec<T> {
  fn into_observable(self, runtime: &Runtime) -> Observable<T, E> { from_iter(runtime, self) }
}

impl<T: Clone + 'static, E: 'static> IntoObservable<T, E> for VecDeque<T> {
  fn into_observable(self, runtime: &Runtime) -> Observable<T, E> { from_iter(runtime, self) }
}

impl<T: Clone + 'static, E: 'static, const N: usize> IntoObservable<T, E> for [T; N] {
  fn into_observable(self, runtime: &Runtime) -> Observable<T, E> { from_iter(runtime, self) }
}

impl<I, E> IntoObservable<I::Item, E> for Iterable<I>
where
  I: IntoIterator + Clone + 'static,
  I::Item: 'static,
  E: 'static,
{
  fn into_observable(self, runtime: &Runtime) -> Observable<I::Item, E> { from_iter(runtime, self.0) }
}

// ============================================================================
// StreamObserver as a consumer
// ============================================================================

/// A stream observer can consume another observable: everything received is
/// forwarded, and usage faults go to the fault channel.
impl<T: 'static, E: 'static> Observer<T, E> for StreamObserver<T, E> {
  fn next(&mut self, value: T) { self.forward_next(value) }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) { self.forward_complete() }

  fn aborted(&mut self) { self.abort() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, collections::VecDeque, rc::Rc};

  use crate::prelude::*;

  fn collect<T: 'static>(obs: &Observable<T, ()>) -> Rc<RefCell<Vec<T>>> {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    obs.subscribe_next(move |v| c_seen.borrow_mut().push(v));
    seen
  }

  #[test]
  fn same_runtime_is_identity() {
    let rt = Runtime::new();
    let source: Observable<i32, ()> = rt.of([1]);
    let converted = rt.from(source.clone());
    assert!(converted.runtime().same(source.runtime()));
  }

  #[test]
  fn foreign_runtime_is_wrapped() {
    let (q1, q2) = (LocalQueue::new(), LocalQueue::new());
    let rt1 = Runtime::builder().scheduler(q1.clone()).build();
    let rt2 = Runtime::builder().scheduler(q2.clone()).build();
    let converted = rt2.from(rt1.of::<_, ()>([1, 2]));
    assert!(converted.runtime().same(&rt2));
    let seen = collect(&converted);
    q2.run_pending();
    q1.run_pending();
    assert_eq!(*seen.borrow(), vec![1, 2]);
  }

  #[test]
  fn collections() {
    let queue = LocalQueue::new();
    let rt = Runtime::builder().scheduler(queue.clone()).build();
    let from_vec = collect(&rt.from(vec![1, 2]));
    let from_deque = collect(&rt.from(VecDeque::from([3, 4])));
    let from_array = collect(&rt.from([5, 6]));
    let from_iterable = collect(&rt.from(Iterable(7..9)));
    queue.run_pending();
    assert_eq!(*from_vec.borrow(), vec![1, 2]);
    assert_eq!(*from_deque.borrow(), vec![3, 4]);
    assert_eq!(*from_array.borrow(), vec![5, 6]);
    assert_eq!(*from_iterable.borrow(), vec![7, 8]);
  }
}
