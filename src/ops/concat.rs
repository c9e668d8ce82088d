use std::{cell::RefCell, rc::Rc};

use crate::{
  observable::Observable,
  observer::Observer,
  runtime::Runtime,
  subscription::{Cleanup, StreamObserver, Subscription},
};

type Active = Rc<RefCell<Option<Subscription>>>;

pub(crate) fn concat<T: 'static, E: 'static>(
  runtime: &Runtime, sources: Vec<Observable<T, E>>,
) -> Observable<T, E> {
  let sources = Rc::new(sources);
  runtime.create(move |down: StreamObserver<T, E>| {
    let active: Active = Rc::new(RefCell::new(None));
    subscribe_at(&sources, 0, &down, &active);
    Ok(Cleanup::action(move || {
      let current = active.borrow_mut().take();
      if let Some(current) = current {
        current.unsubscribe();
      }
    }))
  })
}

fn subscribe_at<T: 'static, E: 'static>(
  sources: &Rc<Vec<Observable<T, E>>>, index: usize, down: &StreamObserver<T, E>, active: &Active,
) {
  let Some(source) = sources.get(index) else {
    down.forward_complete();
    return;
  };
  let observer = ConcatObserver {
    down: down.clone(),
    sources: sources.clone(),
    index,
    active: active.clone(),
  };
  let subscription = source.subscribe(observer);
  active.borrow_mut().replace(subscription.clone());
  if down.is_closed() {
    subscription.unsubscribe();
  }
}

pub struct ConcatObserver<T, E> {
  down: StreamObserver<T, E>,
  sources: Rc<Vec<Observable<T, E>>>,
  index: usize,
  active: Active,
}

impl<T: 'static, E: 'static> Observer<T, E> for ConcatObserver<T, E> {
  fn next(&mut self, value: T) { self.down.forward_next(value) }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    if self.down.is_closed() {
      return;
    }
    tracing::trace!(index = self.index, "concat source completed");
    subscribe_at(&self.sources, self.index + 1, &self.down, &self.active);
  }

  fn aborted(&mut self) { self.down.abort() }
}
