//
// Copyright (c) 2025 Nathan Fiedler
//

//! The pre-sized segmented array, whose block directory is allocated once at
//! construction for a caller-declared maximum number of blocks.
//!
//! Since the directory never grows, appending never copies anything at all,
//! not even block pointers. In exchange the array can hold at most
//! `2^max_blocks - 1` elements; a push that would need another block fails
//! with [`SegmentError::DirectoryExhausted`].

use crate::block::{BlockDirectory, Iter};
use crate::error::SegmentError;
use crate::math::{capacity_for_blocks, log2};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;
use tracing::debug;

/// Array with a fixed-size block directory whose elements never move once
/// written.
pub struct SegmentedFixedDirectoryArray<T> {
    blocks: BlockDirectory<T>,
    /// number of blocks the directory can ever hold
    max_blocks: usize,
}

impl<T> SegmentedFixedDirectoryArray<T> {
    /// Return an empty array whose directory holds up to `max_blocks` blocks,
    /// for a maximum of `2^max_blocks - 1` elements.
    ///
    /// Returns [`SegmentError::InvalidMaxBlocks`] if `max_blocks` is zero or
    /// greater than the number of bits in a `usize`.
    pub fn new(max_blocks: usize) -> Result<Self, SegmentError> {
        if max_blocks == 0 || max_blocks > usize::BITS as usize {
            return Err(SegmentError::InvalidMaxBlocks { max_blocks });
        }
        Ok(Self {
            blocks: BlockDirectory::with_slots(max_blocks),
            max_blocks,
        })
    }

    /// Return an empty array with just enough directory slots to hold
    /// `max_elements` elements, that is `log2(max_elements) + 1` blocks.
    pub fn for_elements(max_elements: usize) -> Result<Self, SegmentError> {
        Self::new(log2(max_elements.max(1)) + 1)
    }

    /// Appends an element to the back of the array.
    ///
    /// Returns [`SegmentError::DirectoryExhausted`] if the element would need
    /// a block beyond the declared maximum; the array is left unchanged and
    /// the value is dropped. Use [`Self::push_within_capacity()`] to get the
    /// value back instead.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn push(&mut self, value: T) -> Result<(), SegmentError> {
        if self.blocks.is_full() {
            let block = self.blocks.next_block();
            if block >= self.max_blocks {
                debug!(
                    max_blocks = self.max_blocks,
                    len = self.blocks.len(),
                    "block directory exhausted"
                );
                return Err(SegmentError::DirectoryExhausted {
                    max_blocks: self.max_blocks,
                });
            }
            self.blocks.grow();
        }
        self.blocks.write(value);
        Ok(())
    }

    /// Appends an element if there is a free slot in the allocated blocks,
    /// otherwise an error is returned with the element.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn push_within_capacity(&mut self, value: T) -> Result<(), T> {
        if self.blocks.is_full() {
            Err(value)
        } else {
            self.blocks.write(value);
            Ok(())
        }
    }

    /// Retrieve a reference to the element at the given index.
    ///
    /// Returns [`SegmentError::Unwritten`] for an index within the allocated
    /// blocks that has not been pushed yet, and [`SegmentError::OutOfBounds`]
    /// for an index beyond them.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn at(&self, index: usize) -> Result<&T, SegmentError> {
        self.blocks.at(index)
    }

    /// Retrieve a reference to the element at the given index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.blocks.get(index)
    }

    /// Returns a mutable reference to an element.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.blocks.get_mut(index)
    }

    /// Address of the element at the given index, valid until the array is
    /// dropped.
    pub fn element_ptr(&self, index: usize) -> Option<NonNull<T>> {
        self.blocks.slot(index)
    }

    /// Return the number of elements in the array.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the array has a length of 0.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 0
    }

    /// Returns the number of elements the array can hold without allocating
    /// another block.
    pub fn capacity(&self) -> usize {
        self.blocks.capacity()
    }

    /// Returns the number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.blocks.block_count()
    }

    /// Returns the number of blocks the directory was sized for.
    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Returns the number of elements the array can ever hold.
    pub fn max_capacity(&self) -> usize {
        capacity_for_blocks(self.max_blocks)
    }

    /// Returns an iterator over the array.
    pub fn iter(&self) -> Iter<'_, T> {
        self.blocks.iter()
    }
}

impl<T> fmt::Display for SegmentedFixedDirectoryArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SegmentedFixedDirectoryArray(n: {}, c: {}, b: {}, m: {})",
            self.len(),
            self.capacity(),
            self.block_count(),
            self.max_blocks
        )
    }
}

impl<T: fmt::Debug> fmt::Debug for SegmentedFixedDirectoryArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for SegmentedFixedDirectoryArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        let Some(item) = self.get(index) else {
            panic!("index out of bounds: {}", index);
        };
        item
    }
}

impl<T> IndexMut<usize> for SegmentedFixedDirectoryArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let Some(item) = self.get_mut(index) else {
            panic!("index out of bounds: {}", index);
        };
        item
    }
}

impl<'a, T> IntoIterator for &'a SegmentedFixedDirectoryArray<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
