//! Operators
//!
//! Every operator builds a new
//! [`Observable`](crate::observable::Observable) whose producer subscribes to
//! the source(s) and forwards into its own stream observer, so each derived
//! subscription goes through the same state machine as a hand written one.
//! Results are wrapped by the caller's [`Species`].
//!
//! Fallible variants (`try_*`) take closures returning `Result`; an `Err`
//! becomes the derived stream's error and unsubscribes from the source.

use crate::{
  error::Error,
  observable::{IntoObservable, Species},
};

pub mod combine_latest;
pub mod concat;
pub mod filter;
pub mod flat_map;
pub mod for_each;
pub mod into_stream;
pub mod map;
pub mod merge;
pub mod reduce;
pub mod take_until;
pub mod zip;

pub use for_each::ForEach;
pub use into_stream::IntoStream;

/// Operators available on every [`Species`].
pub trait ObservableExt<T: 'static, E: 'static>: Species<T, E> {
  /// Applies `f` to each value.
  ///
  /// ```rust
  /// use pushstream::prelude::*;
  ///
  /// let queue = LocalQueue::new();
  /// let rt = Runtime::builder().scheduler(queue.clone()).build();
  /// rt.of::<_, ()>([1, 2, 3]).map(|v| v * 10).subscribe_next(|v| println!("{v}"));
  /// queue.run_pending();
  /// ```
  fn map<U: 'static, F>(self, f: F) -> Self::With<U, E>
  where
    F: Fn(T) -> U + 'static,
  {
    self.try_map(move |v| Ok(f(v)))
  }

  /// Like [`map`](ObservableExt::map); an `Err` from `f` ends the stream with
  /// that error.
  fn try_map<U: 'static, F>(self, f: F) -> Self::With<U, E>
  where
    F: Fn(T) -> Result<U, E> + 'static,
  {
    self.species(map::try_map(self.observable().clone(), f))
  }

  /// Forwards the values `f` accepts.
  fn filter<F>(self, f: F) -> Self::With<T, E>
  where
    F: Fn(&T) -> bool + 'static,
  {
    self.try_filter(move |v| Ok(f(v)))
  }

  fn try_filter<F>(self, f: F) -> Self::With<T, E>
  where
    F: Fn(&T) -> Result<bool, E> + 'static,
  {
    self.species(filter::try_filter(self.observable().clone(), f))
  }

  /// Folds the values with the first one as the seed and emits the result on
  /// completion. An empty source fails with [`Error::EmptySequence`].
  fn reduce<F>(self, f: F) -> Self::With<T, E>
  where
    F: Fn(T, T) -> T + 'static,
    E: From<Error>,
  {
    self.try_reduce(move |acc, v| Ok(f(acc, v)))
  }

  fn try_reduce<F>(self, f: F) -> Self::With<T, E>
  where
    F: Fn(T, T) -> Result<T, E> + 'static,
    E: From<Error>,
  {
    self.species(reduce::reduce(self.observable().clone(), reduce::Unseeded(f)))
  }

  /// Folds the values starting from `seed`; an empty source emits `seed`.
  fn reduce_initial<A, F>(self, seed: A, f: F) -> Self::With<A, E>
  where
    A: Clone + 'static,
    F: Fn(A, T) -> A + 'static,
  {
    self.try_reduce_initial(seed, move |acc, v| Ok(f(acc, v)))
  }

  fn try_reduce_initial<A, F>(self, seed: A, f: F) -> Self::With<A, E>
  where
    A: Clone + 'static,
    F: Fn(A, T) -> Result<A, E> + 'static,
  {
    self.species(reduce::reduce(self.observable().clone(), reduce::Seeded { seed, f }))
  }

  /// Emits this stream's values, then those of each of `others` in turn.
  /// The next source is only subscribed once the previous one completed.
  fn concat<I>(self, others: I) -> Self::With<T, E>
  where
    I: IntoIterator,
    I::Item: IntoObservable<T, E>,
  {
    let source = self.observable().clone();
    let runtime = source.runtime().clone();
    let mut sources = vec![source];
    sources.extend(others.into_iter().map(|o| o.into_observable(&runtime)));
    self.species(concat::concat(&runtime, sources))
  }

  /// Subscribes to the stream `f` returns for each value and forwards what
  /// they emit. Completes once this stream and every inner stream completed.
  fn flat_map<U: 'static, S, F>(self, f: F) -> Self::With<U, E>
  where
    S: IntoObservable<U, E>,
    F: Fn(T) -> S + 'static,
  {
    self.species(flat_map::flat_map(self.observable().clone(), f))
  }

  /// [`flat_map`](ObservableExt::flat_map) with the identity function.
  fn flatten<U: 'static>(self) -> Self::With<U, E>
  where
    T: IntoObservable<U, E>,
  {
    self.flat_map(|inner| inner)
  }

  /// Interleaves this stream with `others`.
  fn merge<I>(self, others: I) -> Self::With<T, E>
  where
    I: IntoIterator,
    I::Item: IntoObservable<T, E>,
  {
    let source = self.observable().clone();
    let runtime = source.runtime().clone();
    let mut sources = vec![source];
    sources.extend(others.into_iter().map(|o| o.into_observable(&runtime)));
    self.species(merge::merge(&runtime, sources))
  }

  /// Forwards values until `notifier` emits or completes, then completes.
  fn take_until<U: 'static, N>(self, notifier: N) -> Self::With<T, E>
  where
    N: IntoObservable<U, E>,
  {
    let source = self.observable().clone();
    let notifier = notifier.into_observable(source.runtime());
    self.species(take_until::take_until(source, notifier))
  }

  /// Subscribes immediately and calls `f` for each value. The returned future
  /// resolves when the stream terminates; dropping it unsubscribes.
  fn for_each<F>(self, mut f: F) -> ForEach<E>
  where
    F: FnMut(T) + 'static,
    E: From<Error>,
  {
    self.try_for_each(move |v| {
      f(v);
      Ok(())
    })
  }

  /// Like [`for_each`](ObservableExt::for_each); an `Err` from `f` resolves
  /// the future with it and unsubscribes.
  fn try_for_each<F>(self, f: F) -> ForEach<E>
  where
    F: FnMut(T) -> Result<(), E> + 'static,
    E: From<Error>,
  {
    for_each::for_each(self.observable(), f)
  }

  /// Subscribes immediately and yields the values as a
  /// `futures_core::Stream` of `Result<T, E>`; dropping it unsubscribes.
  fn into_stream(self) -> IntoStream<T, E> { into_stream::into_stream(self.observable()) }
}

impl<T: 'static, E: 'static, S: Species<T, E>> ObservableExt<T, E> for S {}
