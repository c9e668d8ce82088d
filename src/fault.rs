//! Host fault channel
//!
//! Faults are errors with nowhere else to go: a stream error delivered to an
//! observer without an error handler, a panic raised by a consumer callback or
//! a cleanup action, or a usage fault hit while an operator forwarded a value.
//! They are handed to the [`FaultSink`] configured on the
//! [`Runtime`](crate::runtime::Runtime).

use std::{any::Any, fmt};

use crate::error::Error;

/// An error that reached the host fault channel.
pub enum Fault {
  /// A stream error the consumer did not handle.
  Unhandled { type_name: &'static str, error: Box<dyn Any> },
  /// A panic captured from a consumer callback, a cleanup action or a producer.
  Panic(Box<dyn Any + Send>),
  /// A usage fault returned to library code that could not propagate it.
  Usage(Error),
}

impl Fault {
  pub(crate) fn unhandled<E: 'static>(error: E) -> Self {
    Fault::Unhandled { type_name: std::any::type_name::<E>(), error: Box::new(error) }
  }

  /// Returns the unhandled stream error if it has type `E`.
  pub fn downcast_error<E: 'static>(&self) -> Option<&E> {
    match self {
      Fault::Unhandled { error, .. } => error.downcast_ref::<E>(),
      _ => None,
    }
  }

  /// Returns the panic payload, if this fault is a captured panic.
  pub fn panic_payload(&self) -> Option<&(dyn Any + Send)> {
    match self {
      Fault::Panic(payload) => Some(&**payload),
      _ => None,
    }
  }

  /// A human readable description of the fault.
  pub fn message(&self) -> String {
    match self {
      Fault::Unhandled { type_name, .. } => format!("unhandled stream error of type `{type_name}`"),
      Fault::Panic(payload) => {
        let text = payload
          .downcast_ref::<&str>()
          .copied()
          .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
          .unwrap_or("<non-string panic payload>");
        format!("callback panicked: {text}")
      }
      Fault::Usage(err) => format!("usage fault: {err}"),
    }
  }
}

impl fmt::Debug for Fault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Fault").field(&self.message()).finish()
  }
}

/// Receives every [`Fault`] raised by subscriptions of one runtime.
pub trait FaultSink {
  fn report(&self, fault: Fault);
}

impl<F: Fn(Fault)> FaultSink for F {
  #[inline]
  fn report(&self, fault: Fault) { self(fault) }
}
