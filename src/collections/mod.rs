//! Thread-safe collections.
//!
//! [`ConcurrentVec`] is a growable array behind a reader/writer lock. It
//! offers two ways to iterate:
//!
//! | Iterator | Created by | Sees later mutations | Can mutate |
//! | --- | --- | --- | --- |
//! | [`Snapshot`] | [`iter`], `for x in &vec` | no | no |
//! | [`SnapshotCursor`] | [`list_iter`] | no | no, returns [`CollectionError::Unsupported`] |
//! | [`SyncIter`] | [`sync_iter`] | yes | no |
//! | [`SyncCursor`] | [`sync_list_iter`] | yes | yes |
//!
//! Snapshot iteration is the default. Snapshots copy the element values,
//! so elements with shared interior state (`Arc<Mutex<_>>` and the like) stay
//! shared between the snapshot and the live collection.
//!
//! [`iter`]: ConcurrentVec::iter
//! [`list_iter`]: ConcurrentVec::list_iter
//! [`sync_iter`]: ConcurrentVec::sync_iter
//! [`sync_list_iter`]: ConcurrentVec::sync_list_iter

pub use concurrent_vec::ConcurrentVec;
pub use snapshot::{Snapshot, SnapshotCursor};
pub use sync_iter::{SyncCursor, SyncIter};

mod concurrent_vec;
mod snapshot;
mod sync_iter;

/// Errors returned by [`ConcurrentVec`] and its cursors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// An index was past the end of the collection.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// The requested index.
        index: usize,
        /// The length of the collection when the index was checked.
        len: usize,
    },

    /// The operation is not supported by this iterator.
    #[error("`{0}` is not supported by snapshot iterators")]
    Unsupported(&'static str),

    /// A cursor was asked to modify the current element before returning one.
    #[error("no current element: call `next` or `previous` first")]
    NoCurrentElement,
}

/// A cursor over a list that can move in both directions.
///
/// Mirrors a bidirectional list iterator: the cursor sits between two
/// elements. [`next`](Iterator::next) and [`previous`](Self::previous) move it
/// and return the element they passed over, which becomes the current element
/// for [`set`](Self::set) and [`remove`](Self::remove).
pub trait ListIterator<E>: Iterator<Item = E> {
    /// Returns `true` if [`next`](Iterator::next) would return an element.
    fn has_next(&self) -> bool;

    /// Returns `true` if [`previous`](Self::previous) would return an element.
    fn has_previous(&self) -> bool;

    /// Move the cursor back and return the element it passed over.
    fn previous(&mut self) -> Option<E>;

    /// The index of the element a call to `next` would return.
    fn next_index(&self) -> usize;

    /// The index of the element a call to `previous` would return.
    fn previous_index(&self) -> Option<usize>;

    /// Remove the current element.
    ///
    /// # Errors
    ///
    /// Fails if the cursor has no current element, or does not support
    /// mutation.
    fn remove(&mut self) -> Result<E, CollectionError>;

    /// Replace the current element, returning the old one.
    ///
    /// # Errors
    ///
    /// Fails if the cursor has no current element, or does not support
    /// mutation.
    fn set(&mut self, element: E) -> Result<E, CollectionError>;

    /// Insert an element before the cursor.
    ///
    /// # Errors
    ///
    /// Fails if the cursor does not support mutation.
    fn add(&mut self, element: E) -> Result<(), CollectionError>;
}
