//! Runtime: the collaborators every subscription is wired to
//!
//! A [`Runtime`] carries the deferral queue, the fault sink and the
//! early-delivery policy. It replaces process-wide singletons: observables
//! are created through a runtime and every subscription they start reports to
//! that runtime.

use std::{fmt, panic, rc::Rc};

use crate::{
  fault::{Fault, FaultSink},
  observable::Observable,
  scheduler::{Job, LocalQueue, Scheduler},
  subscription::{StreamObserver, Teardown},
};

/// What a stream observer does with deliveries made while its producer
/// function is still running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EarlyDelivery {
  /// Reject with [`Error::NotReady`](crate::error::Error::NotReady).
  ///
  /// Producers must not deliver synchronously into a subscription that is
  /// not armed yet; they emit from deferred work or from later events.
  #[default]
  Reject,
  /// Queue the deliveries and flush them, in order, on the deferral queue.
  Buffer,
}

struct RuntimeInner {
  scheduler: Rc<dyn Scheduler>,
  fault_sink: Option<Rc<dyn FaultSink>>,
  early_delivery: EarlyDelivery,
}

/// Handle to the injected collaborators. Clones are cheap and share state.
#[derive(Clone)]
pub struct Runtime(Rc<RuntimeInner>);

impl Runtime {
  /// A runtime with a fresh [`LocalQueue`], the default fault behaviour and
  /// [`EarlyDelivery::Reject`].
  pub fn new() -> Self { Self::builder().build() }

  pub fn builder() -> RuntimeBuilder { RuntimeBuilder::default() }

  #[inline]
  pub fn early_delivery(&self) -> EarlyDelivery { self.0.early_delivery }

  /// Schedules `job` on the deferral queue.
  #[inline]
  pub fn defer(&self, job: Job) { self.0.scheduler.defer(job) }

  /// Sends `fault` to the host fault channel.
  ///
  /// Without a configured sink the fault is logged and re-raised from the
  /// deferral queue, so it surfaces in the host without unwinding through the
  /// subscription that produced it.
  pub fn report(&self, fault: Fault) {
    match &self.0.fault_sink {
      Some(sink) => sink.report(fault),
      None => {
        tracing::error!(fault = %fault.message(), "unhandled fault");
        self.defer(Box::new(move || match fault {
          Fault::Panic(payload) => panic::resume_unwind(payload),
          other => panic!("{}", other.message()),
        }));
      }
    }
  }

  /// Creates an observable from a producer function.
  ///
  /// See [`Observable::new`].
  pub fn create<T, E, F, R>(&self, producer: F) -> Observable<T, E>
  where
    T: 'static,
    E: 'static,
    F: Fn(StreamObserver<T, E>) -> Result<R, E> + 'static,
    R: Into<Teardown>,
  {
    Observable::new(self, producer)
  }

  pub(crate) fn same(&self, other: &Runtime) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl Default for Runtime {
  fn default() -> Self { Self::new() }
}

impl fmt::Debug for Runtime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Runtime")
      .field("early_delivery", &self.0.early_delivery)
      .field("fault_sink", &self.0.fault_sink.is_some())
      .finish()
  }
}

// ============================================================================
// RuntimeBuilder
// ============================================================================

/// Configures a [`Runtime`].
///
/// ```rust
/// use pushstream::prelude::*;
///
/// let queue = LocalQueue::default();
/// let rt = Runtime::builder()
///   .scheduler(queue.clone())
///   .fault_sink(|fault: Fault| eprintln!("{fault:?}"))
///   .early_delivery(EarlyDelivery::Buffer)
///   .build();
/// assert_eq!(rt.early_delivery(), EarlyDelivery::Buffer);
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
  scheduler: Option<Rc<dyn Scheduler>>,
  fault_sink: Option<Rc<dyn FaultSink>>,
  early_delivery: EarlyDelivery,
}

impl RuntimeBuilder {
  /// The deferral queue. Defaults to a new [`LocalQueue`].
  pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
    self.scheduler = Some(Rc::new(scheduler));
    self
  }

  /// The host fault channel. Defaults to log-and-reraise.
  pub fn fault_sink(mut self, sink: impl FaultSink + 'static) -> Self {
    self.fault_sink = Some(Rc::new(sink));
    self
  }

  pub fn early_delivery(mut self, policy: EarlyDelivery) -> Self {
    self.early_delivery = policy;
    self
  }

  pub fn build(self) -> Runtime {
    let RuntimeBuilder { scheduler, fault_sink, early_delivery } = self;
    let scheduler = scheduler.unwrap_or_else(|| Rc::new(LocalQueue::new()));
    Runtime(Rc::new(RuntimeInner { scheduler, fault_sink, early_delivery }))
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::error::Error;

  #[test]
  fn defer_goes_through_the_scheduler() {
    let queue = LocalQueue::new();
    let rt = Runtime::builder().scheduler(queue.clone()).build();
    let hit = Rc::new(RefCell::new(false));
    let c_hit = hit.clone();
    rt.defer(Box::new(move || *c_hit.borrow_mut() = true));
    assert!(!*hit.borrow());
    queue.run_pending();
    assert!(*hit.borrow());
  }

  #[test]
  fn configured_sink_receives_faults() {
    let faults = Rc::new(RefCell::new(vec![]));
    let c_faults = faults.clone();
    let rt = Runtime::builder()
      .fault_sink(move |fault: Fault| c_faults.borrow_mut().push(fault.message()))
      .build();
    rt.report(Fault::Usage(Error::Reentrant));
    assert_eq!(faults.borrow().len(), 1);
    assert!(faults.borrow()[0].contains("already dispatching"));
  }

  #[test]
  fn default_sink_reraises_from_the_queue() {
    let queue = LocalQueue::new();
    let rt = Runtime::builder().scheduler(queue.clone()).build();
    rt.report(Fault::Usage(Error::NotReady));
    assert_eq!(queue.len(), 1);
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| queue.run_pending()));
    assert!(result.is_err());
  }

  #[test]
  fn identity() {
    let rt = Runtime::new();
    assert!(rt.same(&rt.clone()));
    assert!(!rt.same(&Runtime::new()));
  }
}
