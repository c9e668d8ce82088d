use std::{
  fmt,
  panic::{self, AssertUnwindSafe},
};

use super::Subscription;
use crate::{fault::Fault, runtime::Runtime};

/// The cleanup a producer hands back: either a plain action or another
/// subscription to cancel.
pub enum Cleanup {
  Action(Box<dyn FnOnce()>),
  Cancel(Subscription),
}

impl Cleanup {
  pub fn action(f: impl FnOnce() + 'static) -> Self { Cleanup::Action(Box::new(f)) }
}

/// A cleanup action normalised to a single callable, or nothing.
///
/// Producers return anything convertible into `Teardown`: `()`, a
/// [`Cleanup`], an `Option<Cleanup>` or a [`Subscription`].
#[derive(Default)]
#[must_use]
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
  pub fn none() -> Self { Teardown(None) }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.is_none() }

  /// Leaves `self` empty so the action cannot run twice.
  #[inline]
  pub(crate) fn take(&mut self) -> Teardown { Teardown(self.0.take()) }

  /// Runs the action. A panic is reported to the runtime's fault channel.
  pub(crate) fn run(self, runtime: &Runtime) {
    let Some(action) = self.0 else { return };
    tracing::debug!("running subscription cleanup");
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
      runtime.report(Fault::Panic(payload));
    }
  }
}

impl From<()> for Teardown {
  fn from(_: ()) -> Self { Teardown::none() }
}

impl From<Cleanup> for Teardown {
  fn from(cleanup: Cleanup) -> Self {
    match cleanup {
      Cleanup::Action(action) => Teardown(Some(action)),
      Cleanup::Cancel(subscription) => Teardown(Some(Box::new(move || subscription.unsubscribe()))),
    }
  }
}

impl From<Option<Cleanup>> for Teardown {
  fn from(cleanup: Option<Cleanup>) -> Self { cleanup.map_or_else(Teardown::none, Teardown::from) }
}

impl From<Subscription> for Teardown {
  fn from(subscription: Subscription) -> Self { Cleanup::Cancel(subscription).into() }
}

impl fmt::Debug for Teardown {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Teardown").field("is_empty", &self.is_empty()).finish()
  }
}
