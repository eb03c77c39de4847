use core::fmt;
use core::iter::FusedIterator;
use std::vec;

use super::{CollectionError, ListIterator};

/// An iterator over a copy of a [`ConcurrentVec`](super::ConcurrentVec).
///
/// This `struct` is created by the [`iter`] method on `ConcurrentVec`. The
/// copy is taken when the iterator is created; mutations made to the
/// collection afterwards are not observed.
///
/// [`iter`]: super::ConcurrentVec::iter
pub struct Snapshot<E> {
    items: vec::IntoIter<E>,
}

impl<E> Snapshot<E> {
    pub(super) fn new(items: Vec<E>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[E] {
        self.items.as_slice()
    }
}

impl<E> Iterator for Snapshot<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<E> DoubleEndedIterator for Snapshot<E> {
    fn next_back(&mut self) -> Option<E> {
        self.items.next_back()
    }
}

impl<E> ExactSizeIterator for Snapshot<E> {}

impl<E> FusedIterator for Snapshot<E> {}

impl<E: fmt::Debug> fmt::Debug for Snapshot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Snapshot").field(&self.as_slice()).finish()
    }
}

/// A bidirectional cursor over a copy of a
/// [`ConcurrentVec`](super::ConcurrentVec).
///
/// This `struct` is created by the [`list_iter`] method on `ConcurrentVec`.
/// Navigation works as on any [`ListIterator`]; `add`, `set` and `remove`
/// always fail with [`CollectionError::Unsupported`].
///
/// [`list_iter`]: super::ConcurrentVec::list_iter
pub struct SnapshotCursor<E> {
    items: Vec<E>,
    cursor: usize,
}

impl<E> SnapshotCursor<E> {
    pub(super) fn new(items: Vec<E>, index: usize) -> Self {
        debug_assert!(index <= items.len());
        Self {
            items,
            cursor: index,
        }
    }
}

impl<E: Clone> Iterator for SnapshotCursor<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl<E: Clone> ListIterator<E> for SnapshotCursor<E> {
    fn has_next(&self) -> bool {
        self.cursor < self.items.len()
    }

    fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    fn previous(&mut self) -> Option<E> {
        let index = self.cursor.checked_sub(1)?;
        self.cursor = index;
        Some(self.items[index].clone())
    }

    fn next_index(&self) -> usize {
        self.cursor
    }

    fn previous_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    fn remove(&mut self) -> Result<E, CollectionError> {
        Err(CollectionError::Unsupported("remove"))
    }

    fn set(&mut self, _element: E) -> Result<E, CollectionError> {
        Err(CollectionError::Unsupported("set"))
    }

    fn add(&mut self, _element: E) -> Result<(), CollectionError> {
        Err(CollectionError::Unsupported("add"))
    }
}

impl<E: fmt::Debug> fmt::Debug for SnapshotCursor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCursor")
            .field("items", &self.items)
            .field("cursor", &self.cursor)
            .finish()
    }
}
