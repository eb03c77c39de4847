use core::fmt;

use super::{CollectionError, ConcurrentVec, ListIterator};

/// An iterator over the live state of a [`ConcurrentVec`].
///
/// This `struct` is created by the [`sync_iter`] method on `ConcurrentVec`.
///
/// [`sync_iter`]: ConcurrentVec::sync_iter
pub struct SyncIter<'a, E> {
    list: &'a ConcurrentVec<E>,
    cursor: usize,
}

impl<'a, E> SyncIter<'a, E> {
    pub(super) fn new(list: &'a ConcurrentVec<E>) -> Self {
        Self { list, cursor: 0 }
    }
}

impl<E: Clone> Iterator for SyncIter<'_, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let item = self.list.get(self.cursor)?;
        self.cursor += 1;
        Some(item)
    }
}

impl<E> fmt::Debug for SyncIter<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncIter")
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

/// A bidirectional cursor over the live state of a [`ConcurrentVec`].
///
/// This `struct` is created by the [`sync_list_iter`] method on
/// `ConcurrentVec`. Each step takes the lock once. When other threads shrink
/// the collection, a cursor left past the end is clamped to the new length.
///
/// [`sync_list_iter`]: ConcurrentVec::sync_list_iter
pub struct SyncCursor<'a, E> {
    list: &'a ConcurrentVec<E>,
    cursor: usize,
    last: Option<usize>,
}

impl<'a, E> SyncCursor<'a, E> {
    pub(super) fn new(list: &'a ConcurrentVec<E>, index: usize) -> Self {
        Self {
            list,
            cursor: index,
            last: None,
        }
    }
}

impl<E: Clone> Iterator for SyncCursor<'_, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let item = self.list.get(self.cursor)?;
        self.last = Some(self.cursor);
        self.cursor += 1;
        Some(item)
    }
}

impl<E: Clone> ListIterator<E> for SyncCursor<'_, E> {
    fn has_next(&self) -> bool {
        self.cursor < self.list.len()
    }

    fn has_previous(&self) -> bool {
        self.previous_index().is_some()
    }

    fn previous(&mut self) -> Option<E> {
        let cursor = self.cursor;
        let (index, item) = self.list.read(|items| {
            let index = cursor.min(items.len()).checked_sub(1)?;
            Some((index, items[index].clone()))
        })?;
        self.cursor = index;
        self.last = Some(index);
        Some(item)
    }

    fn next_index(&self) -> usize {
        self.cursor
    }

    fn previous_index(&self) -> Option<usize> {
        self.cursor.min(self.list.len()).checked_sub(1)
    }

    fn remove(&mut self) -> Result<E, CollectionError> {
        let index = self.last.take().ok_or(CollectionError::NoCurrentElement)?;
        let item = self.list.remove(index)?;
        if index < self.cursor {
            self.cursor -= 1;
        }
        Ok(item)
    }

    fn set(&mut self, element: E) -> Result<E, CollectionError> {
        let index = self.last.ok_or(CollectionError::NoCurrentElement)?;
        self.list.set(index, element)
    }

    fn add(&mut self, element: E) -> Result<(), CollectionError> {
        let cursor = self.cursor;
        let index = self.list.write(|items| {
            let index = cursor.min(items.len());
            items.insert(index, element);
            index
        });
        self.cursor = index + 1;
        self.last = None;
        Ok(())
    }
}

impl<E> fmt::Debug for SyncCursor<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCursor")
            .field("cursor", &self.cursor)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
