//
// Copyright (c) 2025 Nathan Fiedler
//

//! The block directory shared by both array variants.
//!
//! A [`BlockDirectory`] owns a directory of pointers to independently
//! allocated blocks, where block `b` holds `2^b` elements. Appending never
//! moves an element: when the blocks are full a new block twice the size of
//! the previous one is allocated and its pointer appended to the directory.
//! How the directory itself makes room for that pointer is decided by the
//! array variant that wraps it.
//!
//! # Safety
//!
//! Blocks are allocated with `std::alloc` and are left uninitialized until an
//! element is written, so reads are only ever performed on indices below the
//! element count.

use crate::error::SegmentError;
use crate::math::{block_capacity, locate, log2};
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::{NonNull, drop_in_place, slice_from_raw_parts_mut};
use tracing::trace;

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

fn block_layout<T>(slots: usize) -> Layout {
    Layout::array::<T>(slots).unwrap_or_else(|_| capacity_overflow())
}

/// Allocate an uninitialized block with room for `slots` elements.
fn alloc_block<T>(slots: usize) -> NonNull<T> {
    let layout = block_layout::<T>(slots);
    if layout.size() == 0 {
        // zero-sized types never touch the allocator
        return NonNull::dangling();
    }
    let ptr = unsafe { alloc(layout).cast::<T>() };
    NonNull::new(ptr).unwrap_or_else(|| handle_alloc_error(layout))
}

/// Release a block previously returned by `alloc_block()` with the same
/// number of slots.
unsafe fn dealloc_block<T>(ptr: NonNull<T>, slots: usize) {
    let layout = block_layout::<T>(slots);
    if layout.size() != 0 {
        unsafe { dealloc(ptr.as_ptr().cast::<u8>(), layout) }
    }
}

/// Directory of power-of-two sized blocks plus the number of elements
/// written to them.
pub(crate) struct BlockDirectory<T> {
    /// dope vector, holds pointers to allocated blocks
    dope: Vec<NonNull<T>>,
    /// number of elements written
    count: usize,
    /// number of slots across all allocated blocks
    capacity: usize,
    _marker: PhantomData<T>,
}

// The directory exclusively owns its blocks, same as `Vec<T>` owns its buffer.
unsafe impl<T: Send> Send for BlockDirectory<T> {}
unsafe impl<T: Sync> Sync for BlockDirectory<T> {}

impl<T> BlockDirectory<T> {
    /// Create an empty directory with room for `slots` block pointers and with
    /// block 0 (a single element) already allocated.
    pub(crate) fn with_slots(slots: usize) -> Self {
        let mut dope = Vec::with_capacity(slots.max(1));
        dope.push(alloc_block::<T>(1));
        trace!(block = 0, slots = 1, "allocated block");
        Self {
            dope,
            count: 0,
            capacity: 1,
            _marker: PhantomData,
        }
    }

    /// Number of elements written.
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    /// Number of slots across all allocated blocks, always `2^k - 1` for `k`
    /// blocks.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks allocated so far.
    pub(crate) fn block_count(&self) -> usize {
        self.dope.len()
    }

    /// Returns true if every allocated slot has been written.
    pub(crate) fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Directory position of the block that `grow()` would allocate next.
    pub(crate) fn next_block(&self) -> usize {
        let block = log2(self.capacity + 1);
        debug_assert_eq!(block, self.dope.len());
        block
    }

    /// Allocate the next block, doubling the capacity plus one.
    ///
    /// The caller must have ensured the directory has a free pointer slot so
    /// that appending the new pointer does not reallocate the directory
    /// behind its back.
    pub(crate) fn grow(&mut self) {
        let block = self.next_block();
        let Some(slots) = self.capacity.checked_add(1) else {
            capacity_overflow()
        };
        debug_assert!(self.dope.len() < self.dope.capacity());
        self.dope.push(alloc_block::<T>(slots));
        self.capacity += slots;
        trace!(block, slots, capacity = self.capacity, "allocated block");
    }

    /// Move the block pointers into a new directory with room for `slots`
    /// pointers. Only the pointers are copied, the blocks stay where they are.
    pub(crate) fn relocate_directory(&mut self, slots: usize) {
        debug_assert!(slots >= self.dope.len());
        let mut dope = Vec::with_capacity(slots);
        dope.extend_from_slice(&self.dope);
        self.dope = dope;
    }

    /// Append a value in the slot at index `len()`.
    ///
    /// The caller must have ensured a free slot exists.
    pub(crate) fn write(&mut self, value: T) {
        debug_assert!(self.count < self.capacity);
        let (block, offset) = locate(self.count);
        unsafe {
            self.dope[block].add(offset).write(value);
        }
        self.count += 1;
    }

    /// Pointer to the written element at `index`, if any.
    pub(crate) fn slot(&self, index: usize) -> Option<NonNull<T>> {
        if index >= self.count {
            None
        } else {
            let (block, offset) = locate(index);
            Some(unsafe { self.dope[block].add(offset) })
        }
    }

    /// Pointer to the written element at `index`, or an error describing why
    /// the index cannot be read.
    pub(crate) fn checked_slot(&self, index: usize) -> Result<NonNull<T>, SegmentError> {
        if let Some(ptr) = self.slot(index) {
            Ok(ptr)
        } else if index < self.capacity {
            Err(SegmentError::Unwritten {
                index,
                len: self.count,
            })
        } else {
            Err(SegmentError::OutOfBounds {
                index,
                capacity: self.capacity,
            })
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slot(index).map(|ptr| unsafe { ptr.as_ref() })
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slot(index).map(|mut ptr| unsafe { ptr.as_mut() })
    }

    pub(crate) fn at(&self, index: usize) -> Result<&T, SegmentError> {
        self.checked_slot(index).map(|ptr| unsafe { ptr.as_ref() })
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            blocks: self,
            index: 0,
        }
    }
}

impl<T> Drop for BlockDirectory<T> {
    fn drop(&mut self) {
        // blocks are filled in order, so only the last non-empty block can be
        // partially written
        let mut remaining = self.count;
        for (block, ptr) in self.dope.iter().enumerate() {
            let slots = block_capacity(block);
            if std::mem::needs_drop::<T>() && remaining > 0 {
                let written = remaining.min(slots);
                unsafe {
                    drop_in_place(slice_from_raw_parts_mut(ptr.as_ptr(), written));
                }
                remaining -= written;
            }
            unsafe {
                dealloc_block(*ptr, slots);
            }
        }
        self.dope.clear();
    }
}

/// Immutable iterator over the elements of a segmented array, in index
/// order.
pub struct Iter<'a, T> {
    blocks: &'a BlockDirectory<T>,
    index: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.blocks.get(self.index)?;
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.blocks.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
