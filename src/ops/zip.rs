use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use super::merge::cancel_all;
use crate::{
  observable::{IntoObservable, Observable},
  observer::Observer,
  runtime::Runtime,
  subscription::{Cleanup, DynamicSubscriptions, StreamObserver},
};

impl Runtime {
  /// Pairs up the values of `sources` by index: the n-th emission is a `Vec`
  /// of the n-th value of every source.
  ///
  /// Completes as soon as one source completed and every value it emitted
  /// was paired; fails with the first error.
  pub fn zip<T, E, I>(&self, sources: I) -> Observable<Vec<T>, E>
  where
    T: 'static,
    E: 'static,
    I: IntoIterator,
    I::Item: IntoObservable<T, E>,
  {
    let sources = sources.into_iter().map(|s| s.into_observable(self)).collect();
    zip(self, sources)
  }
}

struct Lane<T> {
  queue: VecDeque<T>,
  completed: bool,
}

struct Lanes<T>(Vec<Lane<T>>);

impl<T> Lanes<T> {
  /// A completed lane with nothing left to pair ends the zip.
  fn exhausted(&self) -> bool { self.0.iter().any(|lane| lane.completed && lane.queue.is_empty()) }

  fn pop_row(&mut self) -> Option<Vec<T>> {
    if self.0.iter().any(|lane| lane.queue.is_empty()) {
      return None;
    }
    self.0.iter_mut().map(|lane| lane.queue.pop_front()).collect()
  }
}

fn zip<T: 'static, E: 'static>(
  runtime: &Runtime, sources: Vec<Observable<T, E>>,
) -> Observable<Vec<T>, E> {
  if sources.is_empty() {
    return runtime.empty();
  }
  let sources = Rc::new(sources);
  runtime.create(move |down: StreamObserver<Vec<T>, E>| {
    let lanes = sources.iter().map(|_| Lane { queue: VecDeque::new(), completed: false }).collect();
    let lanes = Rc::new(RefCell::new(Lanes(lanes)));
    let subscriptions = Rc::new(RefCell::new(DynamicSubscriptions::new()));
    for (index, source) in sources.iter().enumerate() {
      if down.is_closed() {
        break;
      }
      let observer = ZipObserver { down: down.clone(), index, lanes: lanes.clone() };
      subscriptions.borrow_mut().add(source.subscribe(observer));
    }
    Ok(Cleanup::action(move || cancel_all(&subscriptions)))
  })
}

struct ZipObserver<T, E> {
  down: StreamObserver<Vec<T>, E>,
  index: usize,
  lanes: Rc<RefCell<Lanes<T>>>,
}

impl<T: 'static, E: 'static> Observer<T, E> for ZipObserver<T, E> {
  fn next(&mut self, value: T) {
    let (row, exhausted) = {
      let mut lanes = self.lanes.borrow_mut();
      lanes.0[self.index].queue.push_back(value);
      let row = lanes.pop_row();
      (row, lanes.exhausted())
    };
    if let Some(row) = row {
      self.down.forward_next(row);
      if exhausted {
        self.down.forward_complete();
      }
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    let exhausted = {
      let mut lanes = self.lanes.borrow_mut();
      lanes.0[self.index].completed = true;
      lanes.exhausted()
    };
    if exhausted {
      self.down.forward_complete();
    }
  }

  fn aborted(&mut self) { self.down.abort() }
}

#[cfg(test)]
mod tests {
  use crate::{
    prelude::*,
    test_util::{local, local_with_faults, manual, marble, panicking, record, values, Event},
  };

  #[test]
  fn pairs_by_index() {
    let (rt, queue) = local();
    let zipped = rt.zip([marble::<()>(&rt, "a-b-c"), marble(&rt, "ABCD")]);
    let (_, events) = record(&zipped);
    queue.run_pending();
    let output: Vec<String> = values(&events).iter().map(|v| v.iter().collect()).collect();
    assert_eq!(output, vec!["aA", "bB", "cC"]);
    assert_eq!(events.borrow().last(), Some(&Event::Complete));
  }

  #[test]
  fn completes_once_the_short_side_drained() {
    let (rt, _queue) = local();
    let (a, a_observers) = manual::<i32, ()>(&rt);
    let (b, b_observers) = manual::<i32, ()>(&rt);
    let (sub, events) = record(&rt.zip([a, b]));
    let (a, b) = (a_observers.borrow()[0].clone(), b_observers.borrow()[0].clone());
    a.next(1).unwrap();
    a.next(2).unwrap();
    a.complete().unwrap();
    assert!(events.borrow().is_empty());
    b.next(10).unwrap();
    assert!(!sub.is_closed());
    b.next(20).unwrap();
    assert_eq!(
      *events.borrow(),
      vec![Event::Next(vec![1, 10]), Event::Next(vec![2, 20]), Event::Complete]
    );
    assert!(b.is_closed());
  }

  #[test]
  fn panicking_source_cancels_the_rest() {
    let (rt, queue, faults) = local_with_faults();
    let (a, a_observers) = manual::<i32, ()>(&rt);
    let (sub, events) = record(&rt.zip([a, panicking(&rt)]));
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Aborted]);
    assert!(sub.is_closed());
    assert!(a_observers.borrow()[0].is_closed());
    assert_eq!(faults.borrow().len(), 1);
  }
}
