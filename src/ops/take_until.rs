use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{Cleanup, StreamObserver},
};

/// The notifier is subscribed before the source, so a notification that
/// arrives in the same tick as a source value wins.
pub(crate) fn take_until<T, U, E>(
  source: Observable<T, E>, notifier: Observable<U, E>,
) -> Observable<T, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
{
  let runtime = source.runtime().clone();
  runtime.create(move |down: StreamObserver<T, E>| {
    let notified = notifier.subscribe(NotifierObserver { down: down.clone() });
    let forwarded = source.subscribe(down);
    Ok(Cleanup::action(move || {
      forwarded.unsubscribe();
      notified.unsubscribe();
    }))
  })
}

struct NotifierObserver<T, E> {
  down: StreamObserver<T, E>,
}

impl<T: 'static, E: 'static, U> Observer<U, E> for NotifierObserver<T, E> {
  fn next(&mut self, _: U) { self.down.forward_complete() }

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
    test_util::{local, local_with_faults, marble, panicking, record, values, Event},
  };

  #[test]
  fn takes_values_until_the_notifier_emits() {
    let (rt, queue) = local();
    let (_, events) = record(&marble::<()>(&rt, "a-b-c-d").take_until(marble::<()>(&rt, "---x")));
    queue.run_pending();
    assert_eq!(values(&events), vec!['a', 'b']);
    assert_eq!(events.borrow().last(), Some(&Event::Complete));
  }

  #[test]
  fn takes_values_until_the_notifier_completes() {
    let (rt, queue) = local();
    let (_, events) = record(&marble::<()>(&rt, "a-b-c-d").take_until(marble::<()>(&rt, "-")));
    queue.run_pending();
    assert_eq!(values(&events), vec!['a']);
  }

  #[test]
  fn notifier_errors_are_forwarded() {
    let (rt, queue) = local();
    let failing = rt.create(|_: StreamObserver<(), &'static str>| Err::<(), _>("stop"));
    let (_, events) = record(&marble(&rt, "abc").take_until(failing));
    queue.run_pending();
    assert_eq!(events.borrow().last(), Some(&Event::Error("stop")));
  }

  #[test]
  fn panicking_notifier_aborts() {
    let (rt, queue, faults) = local_with_faults();
    let (sub, events) = record(&marble::<()>(&rt, "abc").take_until(panicking::<(), ()>(&rt)));
    queue.run_pending();
    assert_eq!(*events.borrow(), vec![Event::Aborted]);
    assert!(sub.is_closed());
    assert_eq!(faults.borrow().len(), 1);
  }
}
