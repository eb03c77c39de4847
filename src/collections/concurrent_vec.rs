use core::cmp::Ordering as CmpOrdering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Range;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::{CollectionError, Snapshot, SnapshotCursor, SyncCursor, SyncIter};

/// A growable array that can be shared between threads.
///
/// Every operation takes a single reader/writer lock for its whole duration:
/// reads share it, writes are exclusive. Compound operations that must see a
/// consistent state can use [`read`] and [`write`].
///
/// The lock protects the structure of the collection, not its elements. Index
/// based accessors return clones, and indices may be stale by the time the
/// next call runs, which is why they report out-of-range indices as errors
/// instead of panicking.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use task_chain::collections::ConcurrentVec;
///
/// let list = Arc::new(ConcurrentVec::new());
/// let handles: Vec<_> = (0..4)
///     .map(|n| {
///         let list = list.clone();
///         thread::spawn(move || list.push(n))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(list.len(), 4);
/// ```
///
/// [`read`]: ConcurrentVec::read
/// [`write`]: ConcurrentVec::write
pub struct ConcurrentVec<E> {
    inner: RwLock<Vec<E>>,
    // Mirrors `inner.len()`, written under the write lock. Only `is_empty`
    // reads it.
    len: AtomicUsize,
}

impl<E> ConcurrentVec<E> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Create an empty collection with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(Vec::with_capacity(capacity))
    }

    /// Consume the collection, returning the underlying vector.
    pub fn into_inner(self) -> Vec<E> {
        self.inner.into_inner()
    }

    /// Run `f` with shared access to the elements.
    ///
    /// Writers are blocked until `f` returns. Calling a write operation on the
    /// same collection from `f` deadlocks.
    pub fn read<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the elements.
    ///
    /// Calling any other operation on the same collection from `f` deadlocks.
    pub fn write<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> R {
        let mut inner = self.inner.write();
        let output = f(&mut inner);
        self.len.store(inner.len(), Ordering::Relaxed);
        output
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.read(|items| items.len())
    }

    /// Returns `true` if the collection has no elements.
    ///
    /// Does not take the lock: the answer may already be stale when it is
    /// returned, exactly as if a writer ran right after the check.
    pub fn is_empty(&self) -> bool {
        self.len.load(Ordering::Relaxed) == 0
    }

    /// The number of elements the collection can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Call `f` on every element, in order.
    pub fn for_each(&self, f: impl FnMut(&E)) {
        self.read(|items| items.iter().for_each(f))
    }

    /// Append an element.
    pub fn push(&self, element: E) {
        self.write(|items| items.push(element))
    }

    /// Insert an element at `index`, shifting later elements.
    ///
    /// # Errors
    ///
    /// Fails if `index` is greater than the length.
    pub fn insert(&self, index: usize, element: E) -> Result<(), CollectionError> {
        self.write(|items| {
            check_position(index, items.len())?;
            items.insert(index, element);
            Ok(())
        })
    }

    /// Append every element of `elements`.
    ///
    /// The iterator is drained before the lock is taken.
    pub fn extend_from<I>(&self, elements: I)
    where
        I: IntoIterator<Item = E>,
    {
        let elements: Vec<E> = elements.into_iter().collect();
        self.write(|items| items.extend(elements))
    }

    /// Insert every element of `elements` at `index`, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails if `index` is greater than the length.
    pub fn insert_all<I>(&self, index: usize, elements: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = E>,
    {
        let elements: Vec<E> = elements.into_iter().collect();
        self.write(|items| {
            check_position(index, items.len())?;
            items.splice(index..index, elements);
            Ok(())
        })
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// Fails if `index` is out of bounds.
    pub fn remove(&self, index: usize) -> Result<E, CollectionError> {
        self.write(|items| {
            check_element(index, items.len())?;
            Ok(items.remove(index))
        })
    }

    /// Remove the elements in `range`.
    ///
    /// # Errors
    ///
    /// Fails if the range is reversed or extends past the end.
    pub fn remove_range(&self, range: Range<usize>) -> Result<(), CollectionError> {
        self.write(|items| {
            if range.start > range.end || range.end > items.len() {
                return Err(CollectionError::OutOfBounds {
                    index: range.start.max(range.end),
                    len: items.len(),
                });
            }
            items.drain(range);
            Ok(())
        })
    }

    /// Replace the element at `index`, returning the old one.
    ///
    /// # Errors
    ///
    /// Fails if `index` is out of bounds.
    pub fn set(&self, index: usize, element: E) -> Result<E, CollectionError> {
        self.write(|items| {
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(CollectionError::OutOfBounds { index, len })?;
            Ok(core::mem::replace(slot, element))
        })
    }

    /// Keep only the elements for which `f` returns `true`.
    pub fn retain(&self, f: impl FnMut(&E) -> bool) {
        self.write(|items| items.retain(f))
    }

    /// Remove every element for which `f` returns `true`.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove_if(&self, mut f: impl FnMut(&E) -> bool) -> bool {
        self.write(|items| {
            let before = items.len();
            items.retain(|item| !f(item));
            items.len() != before
        })
    }

    /// Replace every element with the result of `f`.
    pub fn replace_all(&self, mut f: impl FnMut(&E) -> E) {
        self.write(|items| {
            for item in items.iter_mut() {
                *item = f(item);
            }
        })
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.write(Vec::clear)
    }

    /// Sort the elements with a comparator.
    pub fn sort_by(&self, compare: impl FnMut(&E, &E) -> CmpOrdering) {
        self.write(|items| items.sort_by(compare))
    }

    /// Sort the elements by a key.
    pub fn sort_by_key<K: Ord>(&self, key: impl FnMut(&E) -> K) {
        self.write(|items| items.sort_by_key(key))
    }

    /// Reserve room for at least `additional` more elements.
    pub fn reserve(&self, additional: usize) {
        self.write(|items| items.reserve(additional))
    }

    /// Release unused capacity.
    pub fn shrink_to_fit(&self) {
        self.write(Vec::shrink_to_fit)
    }

    /// Iterate over the live collection.
    ///
    /// The lock is taken anew on every step, so the iterator sees mutations
    /// made between steps: elements may be skipped or repeated when others
    /// insert or remove concurrently. Iteration ends as soon as the cursor
    /// passes the current length.
    pub fn sync_iter(&self) -> SyncIter<'_, E> {
        SyncIter::new(self)
    }

    /// A cursor over the live collection, starting before `index`.
    ///
    /// Like [`sync_iter`](Self::sync_iter), every step reads the live state.
    /// Mutations through the cursor are applied to the collection.
    ///
    /// # Errors
    ///
    /// Fails if `index` is greater than the length.
    pub fn sync_list_iter(&self, index: usize) -> Result<SyncCursor<'_, E>, CollectionError> {
        check_position(index, self.len())?;
        Ok(SyncCursor::new(self, index))
    }
}

impl<E: Clone> ConcurrentVec<E> {
    /// A clone of the element at `index`.
    pub fn get(&self, index: usize) -> Option<E> {
        self.read(|items| items.get(index).cloned())
    }

    /// A clone of the first element.
    pub fn first(&self) -> Option<E> {
        self.read(|items| items.first().cloned())
    }

    /// A clone of the last element.
    pub fn last(&self) -> Option<E> {
        self.read(|items| items.last().cloned())
    }

    /// Copy the elements into a new vector.
    pub fn to_vec(&self) -> Vec<E> {
        self.read(<[E]>::to_vec)
    }

    /// Iterate over a copy of the collection, taken now.
    ///
    /// This is the default way to iterate, also used by `for x in &vec`.
    pub fn iter(&self) -> Snapshot<E> {
        Snapshot::new(self.to_vec())
    }

    /// Same as [`iter`](Self::iter).
    pub fn snapshot(&self) -> Snapshot<E> {
        self.iter()
    }

    /// A cursor over a copy of the collection, starting before `index`.
    ///
    /// The cursor rejects mutation with [`CollectionError::Unsupported`].
    ///
    /// # Errors
    ///
    /// Fails if `index` is greater than the length of the copy.
    pub fn list_iter(&self, index: usize) -> Result<SnapshotCursor<E>, CollectionError> {
        let items = self.to_vec();
        check_position(index, items.len())?;
        Ok(SnapshotCursor::new(items, index))
    }
}

impl<E: PartialEq> ConcurrentVec<E> {
    /// Returns `true` if the collection contains `element`.
    pub fn contains(&self, element: &E) -> bool {
        self.read(|items| items.contains(element))
    }

    /// Returns `true` if the collection contains every one of `elements`.
    pub fn contains_all(&self, elements: &[E]) -> bool {
        self.read(|items| elements.iter().all(|element| items.contains(element)))
    }

    /// The index of the first occurrence of `element`.
    pub fn index_of(&self, element: &E) -> Option<usize> {
        self.read(|items| items.iter().position(|item| item == element))
    }

    /// The index of the last occurrence of `element`.
    pub fn last_index_of(&self, element: &E) -> Option<usize> {
        self.read(|items| items.iter().rposition(|item| item == element))
    }

    /// Remove the first occurrence of `element`.
    ///
    /// Returns `true` if it was present.
    pub fn remove_item(&self, element: &E) -> bool {
        self.write(|items| match items.iter().position(|item| item == element) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        })
    }

    /// Remove every element that is also in `elements`.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove_all(&self, elements: &[E]) -> bool {
        self.remove_if(|item| elements.contains(item))
    }

    /// Keep only the elements that are also in `elements`.
    ///
    /// Returns `true` if anything was removed.
    pub fn retain_all(&self, elements: &[E]) -> bool {
        self.remove_if(|item| !elements.contains(item))
    }
}

impl<E: Ord> ConcurrentVec<E> {
    /// Sort the elements.
    pub fn sort(&self) {
        self.write(|items| items.sort())
    }
}

/// `index` must name an element.
fn check_element(index: usize, len: usize) -> Result<(), CollectionError> {
    if index < len {
        Ok(())
    } else {
        Err(CollectionError::OutOfBounds { index, len })
    }
}

/// `index` must name a position between elements, the end included.
fn check_position(index: usize, len: usize) -> Result<(), CollectionError> {
    if index <= len {
        Ok(())
    } else {
        Err(CollectionError::OutOfBounds { index, len })
    }
}

impl<E> Default for ConcurrentVec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> From<Vec<E>> for ConcurrentVec<E> {
    fn from(items: Vec<E>) -> Self {
        Self {
            len: AtomicUsize::new(items.len()),
            inner: RwLock::new(items),
        }
    }
}

impl<E> FromIterator<E> for ConcurrentVec<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from(Vec::from_iter(iter))
    }
}

impl<E> Extend<E> for ConcurrentVec<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        let items = self.inner.get_mut();
        items.extend(iter);
        *self.len.get_mut() = items.len();
    }
}

impl<E: Clone> Clone for ConcurrentVec<E> {
    fn clone(&self) -> Self {
        Self::from(self.to_vec())
    }
}

impl<E: Clone> IntoIterator for &ConcurrentVec<E> {
    type Item = E;
    type IntoIter = Snapshot<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E> IntoIterator for ConcurrentVec<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_inner().into_iter()
    }
}

impl<E: fmt::Debug> fmt::Debug for ConcurrentVec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|items| f.debug_list().entries(items).finish())
    }
}

/// Renders the elements as `[a, b, c]`.
impl<E: fmt::Display> fmt::Display for ConcurrentVec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|items| {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str("]")
        })
    }
}

/// Compares the elements of both collections.
///
/// `other` is copied before `self` is locked, so comparing two collections
/// never holds both locks at once.
impl<E: PartialEq + Clone> PartialEq for ConcurrentVec<E> {
    fn eq(&self, other: &Self) -> bool {
        if ptr::eq(self, other) {
            return true;
        }
        let other = other.to_vec();
        self.read(|items| items == other.as_slice())
    }
}

impl<E: Eq + Clone> Eq for ConcurrentVec<E> {}

impl<E: PartialEq> PartialEq<[E]> for ConcurrentVec<E> {
    fn eq(&self, other: &[E]) -> bool {
        self.read(|items| items == other)
    }
}

impl<E: PartialEq> PartialEq<Vec<E>> for ConcurrentVec<E> {
    fn eq(&self, other: &Vec<E>) -> bool {
        self == other.as_slice()
    }
}

impl<E: Hash> Hash for ConcurrentVec<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.read(|items| items.hash(state))
    }
}

#[cfg(feature = "serde")]
impl<E: serde::Serialize> serde::Serialize for ConcurrentVec<E> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.read(|items| serde::Serialize::serialize(items, serializer))
    }
}

#[cfg(feature = "serde")]
impl<'de, E: serde::Deserialize<'de>> serde::Deserialize<'de> for ConcurrentVec<E> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Vec<E> as serde::Deserialize<'de>>::deserialize(deserializer).map(Self::from)
    }
}
