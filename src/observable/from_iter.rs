use crate::{observable::Observable, runtime::Runtime, subscription::StreamObserver};

/// Creates an observable that produces values from an iterable.
///
/// The values are emitted from one job on the deferral queue, never while
/// `subscribe` is running. Emission stops as soon as the subscription closes
/// and completes after the last element.
pub(crate) fn from_iter<I, E>(runtime: &Runtime, iterable: I) -> Observable<I::Item, E>
where
  I: IntoIterator + Clone + 'static,
  I::Item: 'static,
  E: 'static,
{
  runtime.create(move |observer: StreamObserver<I::Item, E>| {
    let iter = iterable.clone();
    let emitter = observer.clone();
    observer.runtime().defer(Box::new(move || {
      for item in iter {
        if emitter.is_closed() {
          return;
        }
        emitter.forward_next(item);
      }
      emitter.forward_complete();
    }));
    Ok(())
  })
}

/// Marks any cloneable `IntoIterator` as convertible into an observable.
///
/// ```rust
/// use pushstream::prelude::*;
///
/// let rt = Runtime::new();
/// let evens: Observable<u32, ()> = rt.from(Iterable((0..10).step_by(2)));
/// # let _ = evens;
/// ```
#[derive(Clone, Debug)]
pub struct Iterable<I>(pub I);
