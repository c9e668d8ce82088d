//! Subscriptions
//!
//! One [`Subscription`] governs one producer to consumer connection. The
//! state machine lives in [`state`]; this module holds the public handle
//! returned by `subscribe` and its RAII guard.

use std::{fmt, rc::Rc};

mod dynamic;
mod state;
mod teardown;

pub use dynamic::DynamicSubscriptions;
pub(crate) use state::{start, Producer};
pub use state::{StreamObserver, SubscriptionState};
pub use teardown::{Cleanup, Teardown};

/// Type-erased view of a subscription's lifecycle.
pub(crate) trait Lifecycle {
  fn cancel(&self);
  fn is_closed(&self) -> bool;
}

/// Handle to cancel an active subscription.
///
/// Clones refer to the same subscription. Unsubscribing forces the
/// subscription closed and runs its cleanup action; doing it again is a no-op.
#[derive(Clone)]
pub struct Subscription(Rc<dyn Lifecycle>);

impl Subscription {
  pub(crate) fn new(lifecycle: Rc<dyn Lifecycle>) -> Self { Self(lifecycle) }

  /// Closes the subscription: no further deliveries reach the consumer and
  /// the cleanup action runs, exactly once.
  #[inline]
  pub fn unsubscribe(&self) { self.0.cancel() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard::new(self) }

  /// Returns `true` when both handles control the same subscription.
  pub fn same(&self, other: &Subscription) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription").field("is_closed", &self.is_closed()).finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard {
  subscription: Subscription,
  armed: bool,
}

impl SubscriptionGuard {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: Subscription) -> SubscriptionGuard {
    SubscriptionGuard { subscription, armed: true }
  }

  pub fn subscription(&self) -> &Subscription { &self.subscription }

  /// Gives the subscription back without unsubscribing.
  pub fn into_inner(mut self) -> Subscription {
    self.armed = false;
    self.subscription.clone()
  }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) {
    if self.armed {
      self.subscription.unsubscribe()
    }
  }
}
