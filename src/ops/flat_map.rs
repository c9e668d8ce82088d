//! FlatMap operator implementation
//!
//! Each outer value is turned into an inner observable and subscribed at
//! once. Inner subscriptions are kept in a [`DynamicSubscriptions`] so an
//! inner stream removes itself on completion and cancelling the derived
//! subscription reaches every inner stream still running.
//!
//! The derived stream completes only when the outer source has completed and
//! no inner subscription remains.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use super::merge::cancel_all;
use crate::{
  observable::{IntoObservable, Observable},
  observer::Observer,
  subscription::{Cleanup, DynamicSubscriptions, StreamObserver, Subscription},
};

type Inners = Rc<RefCell<DynamicSubscriptions<Subscription>>>;

pub(crate) fn flat_map<T, U, E, S, F>(source: Observable<T, E>, f: F) -> Observable<U, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
  S: IntoObservable<U, E>,
  F: Fn(T) -> S + 'static,
{
  let f = Rc::new(f);
  let runtime = source.runtime().clone();
  runtime.create(move |down: StreamObserver<U, E>| {
    let inners: Inners = Rc::new(RefCell::new(DynamicSubscriptions::new()));
    let outer_done = Rc::new(Cell::new(false));
    let outer = source.subscribe(OuterObserver {
      down,
      f: f.clone(),
      inners: inners.clone(),
      outer_done,
    });
    Ok(Cleanup::action(move || {
      cancel_all(&inners);
      outer.unsubscribe();
    }))
  })
}

struct OuterObserver<U, E, F> {
  down: StreamObserver<U, E>,
  f: Rc<F>,
  inners: Inners,
  outer_done: Rc<Cell<bool>>,
}

impl<T, U, E, S, F> Observer<T, E> for OuterObserver<U, E, F>
where
  U: 'static,
  E: 'static,
  S: IntoObservable<U, E>,
  F: Fn(T) -> S,
{
  fn next(&mut self, value: T) {
    if self.down.is_closed() {
      return;
    }
    let inner = (self.f)(value).into_observable(self.down.runtime());
    let id = self.inners.borrow_mut().reserve_id();
    let subscription = inner.subscribe(InnerObserver {
      down: self.down.clone(),
      id,
      inners: self.inners.clone(),
      outer_done: self.outer_done.clone(),
    });
    if !subscription.is_closed() {
      self.inners.borrow_mut().insert(id, subscription);
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    self.outer_done.set(true);
    if self.inners.borrow().is_empty() {
      self.down.forward_complete();
    }
  }

  fn aborted(&mut self) { self.down.abort() }
}

struct InnerObserver<U, E> {
  down: StreamObserver<U, E>,
  id: usize,
  inners: Inners,
  outer_done: Rc<Cell<bool>>,
}

impl<U: 'static, E: 'static> Observer<U, E> for InnerObserver<U, E> {
  fn next(&mut self, value: U) { self.down.forward_next(value) }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    let drained = {
      let mut inners = self.inners.borrow_mut();
      inners.remove(self.id);
      inners.is_empty()
    };
    if drained && self.outer_done.get() {
      self.down.forward_complete();
    }
  }

  fn aborted(&mut self) { self.down.abort() }
}
