//! Reduce operator implementation
//!
//! Folds the source into one accumulated value, emitted followed by
//! `complete` once the source completes. The accumulator lives in the
//! observer, so every subscription folds independently.

use std::rc::Rc;

use crate::{
  error::Error,
  observable::Observable,
  observer::Observer,
  subscription::StreamObserver,
};

/// Seeded or unseeded folding logic.
pub trait ReduceStrategy<A, T, E> {
  /// Folds `value` into `acc`; `None` means nothing was folded yet.
  fn apply(&self, acc: Option<A>, value: T) -> Result<A, E>;

  /// The result once the source completed.
  fn finish(&self, acc: Option<A>) -> Result<A, E>;
}

/// `reduce`: the first value is the seed and is not passed through `f`.
pub struct Unseeded<F>(pub F);

impl<T, E, F> ReduceStrategy<T, T, E> for Unseeded<F>
where
  E: From<Error>,
  F: Fn(T, T) -> Result<T, E>,
{
  fn apply(&self, acc: Option<T>, value: T) -> Result<T, E> {
    match acc {
      Some(acc) => (self.0)(acc, value),
      None => Ok(value),
    }
  }

  fn finish(&self, acc: Option<T>) -> Result<T, E> { acc.ok_or_else(|| Error::EmptySequence.into()) }
}

/// `reduce_initial`: every subscription starts from a clone of `seed`.
pub struct Seeded<A, F> {
  pub seed: A,
  pub f: F,
}

impl<A, T, E, F> ReduceStrategy<A, T, E> for Seeded<A, F>
where
  A: Clone,
  F: Fn(A, T) -> Result<A, E>,
{
  fn apply(&self, acc: Option<A>, value: T) -> Result<A, E> {
    (self.f)(acc.unwrap_or_else(|| self.seed.clone()), value)
  }

  fn finish(&self, acc: Option<A>) -> Result<A, E> { Ok(acc.unwrap_or_else(|| self.seed.clone())) }
}

pub(crate) fn reduce<T, A, E, S>(source: Observable<T, E>, strategy: S) -> Observable<A, E>
where
  T: 'static,
  A: 'static,
  E: 'static,
  S: ReduceStrategy<A, T, E> + 'static,
{
  let strategy = Rc::new(strategy);
  let runtime = source.runtime().clone();
  runtime.create(move |down: StreamObserver<A, E>| {
    Ok(source.subscribe(ReduceObserver { down, strategy: strategy.clone(), acc: None }))
  })
}

pub struct ReduceObserver<A, E, S> {
  down: StreamObserver<A, E>,
  strategy: Rc<S>,
  acc: Option<A>,
}

impl<T, A, E, S> Observer<T, E> for ReduceObserver<A, E, S>
where
  A: 'static,
  E: 'static,
  S: ReduceStrategy<A, T, E>,
{
  fn next(&mut self, value: T) {
    match self.strategy.apply(self.acc.take(), value) {
      Ok(acc) => self.acc = Some(acc),
      Err(err) => self.down.forward_error(err),
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    match self.strategy.finish(self.acc.take()) {
      Ok(acc) => {
        self.down.forward_next(acc);
        self.down.forward_complete();
      }
      Err(err) => self.down.forward_error(err),
    }
  }

  fn aborted(&mut self) { self.down.abort() }
}

#[cfg(test)]
mod tests {
  use crate::{
    prelude::*,
    test_util::{local, record, Event},
  };

  #[derive(Debug, PartialEq)]
  enum TestError {
    Stream(Error),
    Odd(i32),
  }

  impl From<Error> for TestError {
    fn from(err: Error) -> Self { TestError::Stream(err) }
  }

  #[test]
  fn reduce_initial() {
    let (rt, queue) = local();
    let (_, events) = record(&rt.of::<_, ()>([1, 1, 1, 1, 1]).reduce_initial(100, |acc, v| acc + v));
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Next(105), Event::Complete]);
  }

  #[test]
  fn reduce_initial_on_empty_observable() {
    let (rt, queue) = local();
    let (_, events) = record(&rt.empty::<i32, ()>().reduce_initial(100, |acc, v| acc + v));
    queue.run_pending();
    // expected to emit the initial value
    assert_eq!(*events.borrow(), vec![Event::Next(100), Event::Complete]);
  }

  #[test]
  fn reduce() {
    let (rt, queue) = local();
    let (_, events) = record(&rt.of::<_, Error>([1, 2, 3, 4]).reduce(|acc, v| acc + v));
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Next(10), Event::Complete]);
  }

  #[test]
  fn reduce_on_empty_observable() {
    let (rt, queue) = local();
    let (_, events) = record(&rt.empty::<i32, Error>().reduce(|acc, v| acc + v));
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Error(Error::EmptySequence)]);
  }

  #[test]
  fn reduce_mixed_types() {
    let (rt, queue) = local();
    let words = rt.of::<_, ()>([String::from("foo"), String::from("bar")]);
    let lengths = words.reduce_initial(0usize, |acc, v| acc + v.len());
    let (_, events) = record(&lengths);
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Next(6), Event::Complete]);
  }

  #[test]
  fn each_subscription_folds_alone() {
    let (rt, queue) = local();
    let sum = rt.of::<_, ()>([1, 2]).reduce_initial(0, |acc, v| acc + v);
    let (_, first) = record(&sum);
    let (_, second) = record(&sum);
    queue.run_pending();
    assert_eq!(*first.borrow(), *second.borrow());
    assert_eq!(first.borrow()[0], Event::Next(3));
  }

  #[test]
  fn failing_accumulator_halts() {
    let (rt, queue) = local();
    let folded = rt
      .of([2, 4, 5, 6])
      .try_reduce(|acc, v| if v % 2 == 1 { Err(TestError::Odd(v)) } else { Ok(acc + v) });
    let (_, events) = record(&folded);
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Error(TestError::Odd(5))]);
  }
}
