//! Fixed-capacity append-only storage.

use crate::error::CapacityExceeded;

/// A pre-allocated buffer with a write cursor.
///
/// The backing allocation is made once in [`FixedArena::with_capacity`] and is
/// never grown: [`FixedArena::append`] refuses writes past the capacity instead
/// of reallocating, and [`FixedArena::clear`] rewinds the cursor while keeping
/// the allocation.
#[derive(Clone, Debug)]
pub struct FixedArena<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T: Copy> FixedArena<T> {
    /// Allocates an empty arena able to hold `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        FixedArena {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends all of `items`, or nothing if they do not fit.
    ///
    /// Returns the new length (the write cursor) on success.
    pub fn append(&mut self, items: &[T]) -> Result<usize, CapacityExceeded> {
        let available = self.remaining();
        if items.len() > available {
            return Err(CapacityExceeded {
                requested: items.len(),
                available,
            });
        }

        self.data.extend_from_slice(items);
        Ok(self.data.len())
    }

    /// Rewinds the write cursor to zero. The allocation is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The write cursor: number of elements written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Is nothing written yet?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of elements this arena can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements that can still be appended.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// The written elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_advances_cursor() {
        let mut arena = FixedArena::with_capacity(4);
        assert_eq!(arena.append(&[1u32, 2]), Ok(2));
        assert_eq!(arena.append(&[3]), Ok(3));
        assert_eq!(arena.as_slice(), &[1, 2, 3]);
        assert_eq!(arena.remaining(), 1);
    }

    #[test]
    fn overflow_leaves_contents_untouched() {
        let mut arena = FixedArena::with_capacity(3);
        arena.append(&[1u32, 2]).unwrap();
        assert_eq!(
            arena.append(&[3, 4]),
            Err(CapacityExceeded {
                requested: 2,
                available: 1
            })
        );
        assert_eq!(arena.as_slice(), &[1, 2]);
    }

    #[test]
    fn clear_keeps_allocation() {
        let mut arena = FixedArena::with_capacity(16);
        arena.append(&[7u8; 16]).unwrap();
        let ptr = arena.as_slice().as_ptr();
        arena.clear();
        assert!(arena.is_empty());
        arena.append(&[1u8; 16]).unwrap();
        assert_eq!(arena.as_slice().as_ptr(), ptr);
        assert_eq!(arena.capacity(), 16);
    }
}
