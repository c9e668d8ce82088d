//! Deferral queue
//!
//! A [`Scheduler`] runs a job later, after the current synchronous call stack
//! has unwound, preserving submission order. The core never suspends on its
//! own: adapters built from collections and the recovery path for a producer
//! that fails during initialization hand their work to the scheduler of the
//! [`Runtime`](crate::runtime::Runtime) instead.

use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce()>;

/// Schedules jobs to run outside the current call stack, in FIFO order.
pub trait Scheduler {
  fn defer(&self, job: Job);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
  #[inline]
  fn defer(&self, job: Job) { (**self).defer(job) }
}

// ============================================================================
// LocalQueue
// ============================================================================

/// A manually drained FIFO job queue.
///
/// Nothing runs until [`LocalQueue::run_pending`] is called, which makes the
/// queue the deterministic choice for tests and for hosts that own their
/// event loop. Clones share the same queue.
///
/// ```rust
/// use pushstream::prelude::*;
///
/// let queue = LocalQueue::default();
/// let rt = Runtime::builder().scheduler(queue.clone()).build();
///
/// rt.defer(Box::new(|| println!("later")));
/// assert_eq!(queue.len(), 1);
/// assert_eq!(queue.run_pending(), 1);
/// ```
#[derive(Clone, Default)]
pub struct LocalQueue {
  jobs: Rc<RefCell<VecDeque<Job>>>,
}

impl LocalQueue {
  pub fn new() -> Self { Self::default() }

  /// Runs jobs until the queue is empty, including jobs scheduled by the jobs
  /// being run. Returns the number of jobs executed.
  pub fn run_pending(&self) -> usize {
    let mut count = 0;
    // The borrow must end before the job runs: jobs schedule more jobs.
    while let Some(job) = self.pop() {
      job();
      count += 1;
    }
    count
  }

  /// Runs at most one job. Returns `false` when the queue was empty.
  pub fn run_one(&self) -> bool {
    match self.pop() {
      Some(job) => {
        job();
        true
      }
      None => false,
    }
  }

  #[inline]
  pub fn len(&self) -> usize { self.jobs.borrow().len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.jobs.borrow().is_empty() }

  fn pop(&self) -> Option<Job> { self.jobs.borrow_mut().pop_front() }
}

impl Scheduler for LocalQueue {
  fn defer(&self, job: Job) { self.jobs.borrow_mut().push_back(job); }
}

impl fmt::Debug for LocalQueue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LocalQueue").field("pending", &self.len()).finish()
  }
}

// ============================================================================
// futures LocalPool integration
// ============================================================================

#[cfg(feature = "futures-scheduler")]
mod futures_scheduler {
  use futures::{executor::LocalSpawner, task::LocalSpawnExt};

  use super::{Job, Scheduler};

  /// Jobs become ready local tasks; the pool polls them in spawn order.
  impl Scheduler for LocalSpawner {
    fn defer(&self, job: Job) {
      if let Err(err) = self.spawn_local(async move { job() }) {
        tracing::warn!(error = %err, "local pool is shut down, deferred job dropped");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn runs_in_submission_order() {
    let queue = LocalQueue::new();
    let log = Rc::new(RefCell::new(vec![]));
    for i in 0..3 {
      let log = log.clone();
      queue.defer(Box::new(move || log.borrow_mut().push(i)));
    }
    assert!(log.borrow().is_empty());
    assert_eq!(queue.run_pending(), 3);
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
    assert!(queue.is_empty());
  }

  #[test]
  fn jobs_scheduled_while_draining_run_last() {
    let queue = LocalQueue::new();
    let log = Rc::new(RefCell::new(vec![]));
    {
      let (q, log) = (queue.clone(), log.clone());
      queue.defer(Box::new(move || {
        log.borrow_mut().push("outer");
        let log = log.clone();
        q.defer(Box::new(move || log.borrow_mut().push("nested")));
      }));
    }
    {
      let log = log.clone();
      queue.defer(Box::new(move || log.borrow_mut().push("second")));
    }

    assert_eq!(queue.run_pending(), 3);
    assert_eq!(*log.borrow(), vec!["outer", "second", "nested"]);
  }

  #[test]
  fn run_one_steps() {
    let queue = LocalQueue::new();
    assert!(!queue.run_one());
    queue.defer(Box::new(|| {}));
    queue.defer(Box::new(|| {}));
    assert!(queue.run_one());
    assert_eq!(queue.len(), 1);
  }

  #[cfg(feature = "futures-scheduler")]
  #[test]
  fn local_spawner_defers() {
    use futures::executor::LocalPool;

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let hit = Rc::new(RefCell::new(vec![]));
    for i in 0..2 {
      let hit = hit.clone();
      spawner.defer(Box::new(move || hit.borrow_mut().push(i)));
    }
    assert!(hit.borrow().is_empty());
    pool.run();
    assert_eq!(*hit.borrow(), vec![0, 1]);
  }
}
