use smallvec::SmallVec;

use super::Subscription;

/// A container of subscriptions keyed by a stable id.
///
/// Operators that spawn inner subscriptions (`flat_map`, `merge`) keep the
/// live ones here: an inner subscription removes itself by id when it
/// completes, and cancelling the outer stream drains and cancels the rest.
///
/// - **SmallVec Optimization**: Uses `SmallVec<[_; 2]>` to avoid heap
///   allocation for the common case of 0-2 items.
/// - **Pre-allocation Pattern**: Supports `reserve_id()` + `insert()` for the
///   case where the inner observer needs its id before the subscription
///   exists.
///
/// ```rust
/// use pushstream::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::default();
///
/// let id1 = subs.add(());
/// let id2 = subs.reserve_id();
/// subs.insert(id2, ());
/// assert_eq!(subs.len(), 2);
///
/// assert!(subs.remove(id1).is_some());
/// assert!(subs.remove(id1).is_none());
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  /// Reserve the next ID without adding an item.
  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Insert an item with a pre-reserved ID.
  #[inline]
  pub fn insert(&mut self, id: usize, item: U) { self.items.push((id, item)); }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    self.items.iter().position(|(i, _)| *i == id).map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Removes every item, leaving the id counter untouched.
  pub fn take_all(&mut self) -> Vec<U> { self.items.drain(..).map(|(_, item)| item).collect() }
}

impl DynamicSubscriptions<Subscription> {
  /// Unsubscribe all items and clear the container.
  ///
  /// Prefer [`take_all`](Self::take_all) followed by unsubscribing when the
  /// container sits in a `RefCell`: cleanups may call back into it.
  pub fn unsubscribe_all(&mut self) {
    for item in self.take_all() {
      item.unsubscribe();
    }
  }

  pub fn all_closed(&self) -> bool { self.items.iter().all(|(_, item)| item.is_closed()) }
}
