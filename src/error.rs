//! Errors raised by the stream machinery itself.
//!
//! Stream errors chosen by producers travel as the generic `E` of
//! [`Observable<T, E>`](crate::observable::Observable). The [`Error`] type
//! here covers what the library reports on its own behalf: usage faults
//! (raised synchronously to the caller that broke the contract) and the few
//! errors operators synthesise. Operators that need to synthesise an error
//! require `E: From<Error>`.

use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// A value or terminal signal was delivered while the producer function was
  /// still running and the runtime rejects early delivery.
  #[error("the subscription is not initialized yet")]
  NotReady,

  /// A delivery re-entered a stream observer that is already dispatching.
  #[error("the stream observer is already dispatching a delivery")]
  Reentrant,

  /// `reduce` without a seed reached completion without seeing a value.
  #[error("cannot reduce an empty sequence")]
  EmptySequence,

  /// A `for_each` future lost its subscription before it terminated.
  #[error("the subscription was dropped before it terminated")]
  Interrupted,
}

impl Error {
  /// Returns a short stable label (snake_case) for use in logs.
  pub fn as_label(&self) -> &'static str {
    match self {
      Error::NotReady => "not_ready",
      Error::Reentrant => "reentrant",
      Error::EmptySequence => "empty_sequence",
      Error::Interrupted => "interrupted",
    }
  }
}
