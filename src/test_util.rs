//! Helpers shared by the unit tests.

use std::{cell::RefCell, rc::Rc};

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T, E> {
  Next(T),
  Error(E),
  Complete,
  /// The source closed because a producer panicked.
  Aborted,
}

pub type Events<T, E> = Rc<RefCell<Vec<Event<T, E>>>>;

/// A runtime backed by a manually drained queue.
pub fn local() -> (Runtime, LocalQueue) {
  let queue = LocalQueue::new();
  (Runtime::builder().scheduler(queue.clone()).build(), queue)
}

/// Like [`local`], with every fault message collected.
pub fn local_with_faults() -> (Runtime, LocalQueue, Rc<RefCell<Vec<String>>>) {
  let queue = LocalQueue::new();
  let faults = Rc::new(RefCell::new(vec![]));
  let c_faults = faults.clone();
  let rt = Runtime::builder()
    .scheduler(queue.clone())
    .fault_sink(move |fault: Fault| c_faults.borrow_mut().push(fault.message()))
    .build();
  (rt, queue, faults)
}

struct Recording<T, E>(Events<T, E>);

impl<T, E> Observer<T, E> for Recording<T, E> {
  fn next(&mut self, value: T) { self.0.borrow_mut().push(Event::Next(value)) }

  fn error(&mut self, err: E) -> Result<(), E> {
    self.0.borrow_mut().push(Event::Error(err));
    Ok(())
  }

  fn complete(&mut self) { self.0.borrow_mut().push(Event::Complete) }

  fn aborted(&mut self) { self.0.borrow_mut().push(Event::Aborted) }
}

/// Subscribes a recorder that logs every delivery.
pub fn record<T: 'static, E: 'static>(source: &Observable<T, E>) -> (Subscription, Events<T, E>) {
  let events = Rc::new(RefCell::new(vec![]));
  (source.subscribe(Recording(events.clone())), events)
}

/// The values delivered so far.
pub fn values<T: Clone, E>(events: &Events<T, E>) -> Vec<T> {
  events
    .borrow()
    .iter()
    .filter_map(|e| match e {
      Event::Next(v) => Some(v.clone()),
      _ => None,
    })
    .collect()
}

/// A producer that hands its stream observer out instead of emitting, so the
/// test drives it by hand.
pub fn manual<T: 'static, E: 'static>(
  rt: &Runtime,
) -> (Observable<T, E>, Rc<RefCell<Vec<StreamObserver<T, E>>>>) {
  let observers = Rc::new(RefCell::new(vec![]));
  let c_observers = observers.clone();
  let obs = rt.create(move |observer: StreamObserver<T, E>| {
    c_observers.borrow_mut().push(observer);
    Ok(())
  });
  (obs, observers)
}

/// A source whose producer panics on every subscribe.
pub fn panicking<T: 'static, E: 'static>(rt: &Runtime) -> Observable<T, E> {
  rt.create(|_: StreamObserver<T, E>| -> Result<(), E> { panic!("producer failed") })
}

/// Marble source: one character per deferral-queue tick, `-` being an empty
/// tick, completing on the tick after the last character.
pub fn marble<E: 'static>(rt: &Runtime, diagram: &'static str) -> Observable<char, E> {
  rt.create(move |observer: StreamObserver<char, E>| {
    tick(observer, diagram.chars().collect::<Vec<_>>().into_iter());
    Ok(())
  })
}

fn tick<E: 'static>(observer: StreamObserver<char, E>, mut chars: std::vec::IntoIter<char>) {
  let rt = observer.runtime().clone();
  rt.defer(Box::new(move || {
    if observer.is_closed() {
      return;
    }
    match chars.next() {
      Some('-') => {}
      Some(c) => observer.next(c).unwrap(),
      None => return observer.complete().unwrap(),
    }
    tick(observer, chars);
  }));
}
