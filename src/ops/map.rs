use std::rc::Rc;

use crate::{
  observable::Observable,
  observer::Observer,
  subscription::StreamObserver,
};

pub(crate) fn try_map<T, U, E, F>(source: Observable<T, E>, f: F) -> Observable<U, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
  F: Fn(T) -> Result<U, E> + 'static,
{
  let f = Rc::new(f);
  let runtime = source.runtime().clone();
  runtime.create(move |down: StreamObserver<U, E>| {
    Ok(source.subscribe(MapObserver { down, f: f.clone() }))
  })
}

pub struct MapObserver<U, E, F> {
  down: StreamObserver<U, E>,
  f: Rc<F>,
}

impl<T, U, E, F> Observer<T, E> for MapObserver<U, E, F>
where
  U: 'static,
  E: 'static,
  F: Fn(T) -> Result<U, E>,
{
  fn next(&mut self, value: T) {
    match (self.f)(value) {
      Ok(mapped) => self.down.forward_next(mapped),
      Err(err) => self.down.forward_error(err),
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) { self.down.forward_complete() }

  fn aborted(&mut self) { self.down.abort() }
}
