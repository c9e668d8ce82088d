use std::{cell::RefCell, rc::Rc};

use super::merge::cancel_all;
use crate::{
  observable::{IntoObservable, Observable},
  observer::Observer,
  runtime::Runtime,
  subscription::{Cleanup, DynamicSubscriptions, StreamObserver},
};

impl Runtime {
  /// Emits the most recent value of every source each time one of them
  /// emits, once all of them have emitted at least once.
  ///
  /// Completes when every source completed; fails with the first error.
  pub fn combine_latest<T, E, I>(&self, sources: I) -> Observable<Vec<T>, E>
  where
    T: Clone + 'static,
    E: 'static,
    I: IntoIterator,
    I::Item: IntoObservable<T, E>,
  {
    let sources = sources.into_iter().map(|s| s.into_observable(self)).collect();
    combine_latest(self, sources)
  }
}

struct Latest<T> {
  values: Vec<Option<T>>,
  remaining: usize,
}

fn combine_latest<T: Clone + 'static, E: 'static>(
  runtime: &Runtime, sources: Vec<Observable<T, E>>,
) -> Observable<Vec<T>, E> {
  if sources.is_empty() {
    return runtime.empty();
  }
  let sources = Rc::new(sources);
  runtime.create(move |down: StreamObserver<Vec<T>, E>| {
    let latest = Rc::new(RefCell::new(Latest {
      values: sources.iter().map(|_| None).collect(),
      remaining: sources.len(),
    }));
    let subscriptions = Rc::new(RefCell::new(DynamicSubscriptions::new()));
    for (index, source) in sources.iter().enumerate() {
      if down.is_closed() {
        break;
      }
      let observer = CombineLatestObserver { down: down.clone(), index, latest: latest.clone() };
      subscriptions.borrow_mut().add(source.subscribe(observer));
    }
    Ok(Cleanup::action(move || cancel_all(&subscriptions)))
  })
}

struct CombineLatestObserver<T, E> {
  down: StreamObserver<Vec<T>, E>,
  index: usize,
  latest: Rc<RefCell<Latest<T>>>,
}

impl<T: Clone + 'static, E: 'static> Observer<T, E> for CombineLatestObserver<T, E> {
  fn next(&mut self, value: T) {
    let snapshot = {
      let mut latest = self.latest.borrow_mut();
      latest.values[self.index] = Some(value);
      latest.values.iter().cloned().collect::<Option<Vec<_>>>()
    };
    if let Some(values) = snapshot {
      self.down.forward_next(values);
    }
  }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.down.forward_error(err);
    Ok(())
  }

  fn complete(&mut self) {
    let remaining = {
      let mut latest = self.latest.borrow_mut();
      latest.remaining -= 1;
      latest.remaining
    };
    if remaining == 0 {
      self.down.forward_complete();
    }
  }
  fn aborted(&mut self) { self.down.abort() }
}

#[cfg(test)]
mod tests {
  use crate::{
    prelude::*,
    test_util::{local, local_with_faults, marble, panicking, record, values, Event},
  };

  #[test]
  fn emits_most_recent_values() {
    let (rt, queue) = local();
    let combined = rt.combine_latest([marble::<()>(&rt, "a-b-c-d"), marble(&rt, "-A-B-C-D")]);
    let (_, events) = record(&combined);
    queue.run_pending();
    let output: Vec<String> = values(&events).iter().map(|v| v.iter().collect()).collect();
    assert_eq!(output, vec!["aA", "bA", "bB", "cB", "cC", "dC", "dD"]);
    assert_eq!(events.borrow().last(), Some(&Event::Complete));
  }

  #[test]
  fn waits_for_every_source() {
    let (rt, queue) = local();
    let combined = rt.combine_latest([marble::<()>(&rt, "abc"), marble(&rt, "---")]);
    let (_, events) = record(&combined);
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Complete]);
  }

  #[test]
  fn panicking_source_cancels_the_rest() {
    let (rt, queue, faults) = local_with_faults();
    let combined = rt.combine_latest([marble::<()>(&rt, "ab"), panicking(&rt)]);
    let (sub, events) = record(&combined);
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Aborted]);
    assert!(sub.is_closed());
    assert!(queue.is_empty());
    assert_eq!(faults.borrow().len(), 1);
  }
}
