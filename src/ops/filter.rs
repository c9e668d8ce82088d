use std::rc::Rc;

use crate::{
  observable::Observable,
  observer::Observer,
  subscription::StreamObserver,
};

pub(crate) fn try_filter<T, E, F>(source: Observable<T, E>, filter: F) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
  F: Fn(&T) -> Result<bool, E> + 'static,
{
  let filter = Rc::new(filter);
  let runtime = source.runtime().clone();
  runtime.create(move |down: StreamObserver<T, E>| {
    Ok(source.subscribe(FilterObserver { down, filter: filter.clone() }))
  })
}

pub struct FilterObserver<T, E, F> {
  down: StreamObserver<T, E>,
  filter: Rc<F>,
}

impl<T, E, F> Observer<T, E> for FilterObserver<T, E, F>
where
  T: 'static,
  E: 'static,
  F: Fn(&T) -> Result<bool, E>,
{
  fn next(&mut self, value: T) {
    match (self.filter)(&value) {
      Ok(true) => self.down.forward_next(value),
      Ok(false) => {}
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

#[cfg(test)]
mod tests {
  use crate::{
    prelude::*,
    test_util::{local, record, values, Event},
  };

  #[test]
  fn fork_and_shared() {
    let (rt, queue) = local();
    let evens = rt.of::<_, ()>(0..10).filter(|v| v % 2 == 0);
    let (_, first) = record(&evens);
    let (_, second) = record(&evens.clone().filter(|v| *v > 4));
    queue.run_pending();
    assert_eq!(values(&first), vec![0, 2, 4, 6, 8]);
    assert_eq!(values(&second), vec![6, 8]);
  }

  #[test]
  fn failing_predicate() {
    let (rt, queue) = local();
    let filtered =
      rt.of([1, 2, 3]).try_filter(|v| if *v == 3 { Err("three".to_string()) } else { Ok(*v > 1) });
    let (_, events) = record(&filtered);
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Next(2), Event::Error("three".to_string())]);
  }
}
