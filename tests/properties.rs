//! Property tests for delivery order, operator composition and cleanup.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use proptest::prelude::*;
use pushstream::prelude::*;

fn local() -> (Runtime, LocalQueue) {
  let queue = LocalQueue::new();
  (Runtime::builder().scheduler(queue.clone()).build(), queue)
}

fn drain<T: 'static>(source: &Observable<T, ()>, queue: &LocalQueue) -> (Vec<T>, bool) {
  let seen = Rc::new(RefCell::new(Vec::<T>::new()));
  let completed = Rc::new(Cell::new(false));
  let (c_seen, c_completed) = (seen.clone(), completed.clone());
  source.subscribe(
    Callbacks::new()
      .on_next(move |v: T| c_seen.borrow_mut().push(v))
      .on_complete(move || c_completed.set(true)),
  );
  queue.run_pending();
  let values = seen.borrow_mut().drain(..).collect();
  (values, completed.get())
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
  #[test]
  fn values_arrive_in_emission_order(items in proptest::collection::vec(any::<i32>(), 0..64)) {
    let (rt, queue) = local();
    let (seen, completed) = drain(&rt.of(items.clone()), &queue);
    prop_assert_eq!(seen, items);
    prop_assert!(completed);
  }

  #[test]
  fn map_chains_fuse(items in proptest::collection::vec(-1000i64..1000, 0..32)) {
    let (rt, queue) = local();
    let chained = rt.of(items.clone()).map(|v| v + 7).map(|v| v * 3);
    let fused = rt.of(items).map(|v| (v + 7) * 3);
    prop_assert_eq!(drain(&chained, &queue), drain(&fused, &queue));
  }

  #[test]
  fn filter_keeps_matching_values_in_order(
    items in proptest::collection::vec(any::<u8>(), 0..64),
    modulus in 1u8..8
  ) {
    let (rt, queue) = local();
    let expected: Vec<u8> = items.iter().copied().filter(|v| v % modulus == 0).collect();
    let (seen, _) = drain(&rt.of(items).filter(move |v| v % modulus == 0), &queue);
    prop_assert_eq!(seen, expected);
  }

  #[test]
  fn concat_preserves_source_order(
    groups in proptest::collection::vec(proptest::collection::vec(any::<u16>(), 0..8), 1..6)
  ) {
    let (rt, queue) = local();
    let expected: Vec<u16> = groups.iter().flatten().copied().collect();
    let mut sources = groups.into_iter().map(|group| rt.of::<_, ()>(group));
    let first = sources.next().unwrap_or_else(|| rt.empty());
    let (seen, completed) = drain(&first.concat(sources.collect::<Vec<_>>()), &queue);
    prop_assert_eq!(seen, expected);
    prop_assert!(completed);
  }

  #[test]
  fn reduce_matches_fold(items in proptest::collection::vec(-100i32..100, 0..32)) {
    let (rt, queue) = local();
    let expected = items.iter().fold(0, |acc, v| acc + v);
    let (seen, completed) = drain(&rt.of(items).reduce_initial(0, |acc, v| acc + v), &queue);
    prop_assert_eq!(seen, vec![expected]);
    prop_assert!(completed);
  }

  #[test]
  fn cleanup_runs_exactly_once(
    emitted in 0usize..5,
    unsubscribe_twice in any::<bool>(),
    terminate in any::<bool>()
  ) {
    let (rt, queue) = local();
    let cleanups = Rc::new(Cell::new(0));
    let c_cleanups = cleanups.clone();
    let source = rt.create(move |observer: StreamObserver<usize, ()>| {
      let emitter = observer.clone();
      observer.runtime().defer(Box::new(move || {
        for v in 0..emitted {
          let _ = emitter.next(v);
        }
        if terminate {
          let _ = emitter.complete();
        }
      }));
      let cleanups = c_cleanups.clone();
      Ok(Cleanup::action(move || cleanups.set(cleanups.get() + 1)))
    });
    let sub = source.subscribe_next(|_| {});
    queue.run_pending();
    sub.unsubscribe();
    if unsubscribe_twice {
      sub.unsubscribe();
    }
    queue.run_pending();
    prop_assert_eq!(cleanups.get(), 1);
    prop_assert!(sub.is_closed());
  }

  #[test]
  fn merge_delivers_every_value(
    left in proptest::collection::vec(any::<i16>(), 0..16),
    right in proptest::collection::vec(any::<i16>(), 0..16)
  ) {
    let (rt, queue) = local();
    let mut expected: Vec<i16> = left.iter().chain(right.iter()).copied().collect();
    let (mut seen, completed) = drain(&rt.merge([left, right]), &queue);
    expected.sort_unstable();
    seen.sort_unstable();
    prop_assert_eq!(seen, expected);
    prop_assert!(completed);
  }
}
