//! A fixed-capacity FIFO ring buffer that overwrites its oldest element when
//! full.
//!
//! ```text
//!   storage: [Option<T>; capacity]
//!   total_inserted: every enqueue ever made (next write slot = total % cap)
//!   first: slot of the oldest retained element
//! ```

use std::fmt;
use std::iter::FusedIterator;

use log::{debug, trace};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("capacity must be at least one")]
    InvalidCapacity,
    #[error("buffer is empty")]
    EmptyBuffer,
}

/// A circular buffer with fixed capacity.
///
/// Enqueueing into a full buffer silently replaces the oldest element.
#[derive(Clone)]
pub struct RingBuffer<T> {
    storage: Vec<Option<T>>,
    total_inserted: u64,
    first: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a new empty ring buffer holding at most `capacity` elements.
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is less than one or
    /// does not fit in a `usize`.
    pub fn new<C: TryInto<usize>>(capacity: C) -> Result<Self, Error> {
        let capacity = capacity
            .try_into()
            .ok()
            .filter(|&c| c >= 1)
            .ok_or(Error::InvalidCapacity)?;

        let mut storage = Vec::with_capacity(capacity);
        storage.resize_with(capacity, || None);
        debug!("created ring buffer with capacity {capacity}");

        Ok(Self {
            storage,
            total_inserted: 0,
            first: 0,
        })
    }

    /// Returns the number of elements the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of elements currently held.
    pub fn size(&self) -> usize {
        self.total_inserted.min(self.capacity() as u64) as usize
    }

    /// Same as [`size`](Self::size).
    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.total_inserted == 0
    }

    /// Returns true once the buffer has reached capacity. It stays full from
    /// then on.
    pub fn is_full(&self) -> bool {
        self.total_inserted >= self.capacity() as u64
    }

    /// Number of `enqueue` calls made over the buffer's lifetime.
    pub fn total_inserted(&self) -> u64 {
        self.total_inserted
    }

    /// Appends an element, overwriting the oldest one if the buffer is full.
    pub fn enqueue(&mut self, item: T) {
        let slot = self.slot(self.total_inserted);
        self.storage[slot] = Some(item);
        if self.is_full() {
            trace!("overwrote slot {slot}, oldest element dropped");
            self.first = (self.first + 1) % self.capacity();
        }
        self.total_inserted += 1;
    }

    /// Returns the oldest element without removing it.
    pub fn peek(&self) -> Result<&T, Error> {
        if self.is_empty() {
            return Err(Error::EmptyBuffer);
        }
        self.storage[self.first].as_ref().ok_or(Error::EmptyBuffer)
    }

    /// Walks logical positions `0..total_inserted`, yielding the slot each
    /// one maps to.
    ///
    /// Once the buffer has wrapped this yields more than [`size`](Self::size)
    /// items and revisits slots. Use [`retained`](Self::retained) for the
    /// current contents only.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            storage: &self.storage,
            pos: 0,
            end: self.total_inserted,
        }
    }

    /// Iterates over the currently held elements, oldest first.
    pub fn retained(&self) -> Retained<'_, T> {
        Retained {
            storage: &self.storage,
            next: self.first,
            remaining: self.size(),
        }
    }

    fn slot(&self, position: u64) -> usize {
        (position % self.capacity() as u64) as usize
    }
}

impl<T: fmt::Debug> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("size", &self.size())
            .field("total_inserted", &self.total_inserted)
            .field("items", &self.retained().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`RingBuffer::iter`].
pub struct Iter<'a, T> {
    storage: &'a [Option<T>],
    pos: u64,
    end: u64,
}

impl<T> Iter<'_, T> {
    pub fn has_next(&self) -> bool {
        self.pos < self.end
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        // Every position below `end` maps to a slot that has been written.
        let slot = (self.pos % self.storage.len() as u64) as usize;
        self.pos += 1;
        self.storage[slot].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.end - self.pos) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator returned by [`RingBuffer::retained`].
pub struct Retained<'a, T> {
    storage: &'a [Option<T>],
    next: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Retained<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.next;
        self.next = (slot + 1) % self.storage.len();
        self.remaining -= 1;
        self.storage[slot].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Retained<'_, T> {}

impl<T> FusedIterator for Retained<'_, T> {}
