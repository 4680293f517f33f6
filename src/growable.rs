//
// Copyright (c) 2025 Nathan Fiedler
//

//! The self-growing segmented array, whose block directory doubles in size
//! whenever every directory slot holds a block.
//!
//! # Memory Usage
//!
//! An empty array holds one block of a single element plus a directory with
//! at least one pointer slot. While holding `N` elements the unused space is
//! less than `N` slots (the last block is at most half empty by count of all
//! slots) and the directory holds at most `2 * log2(N)` pointers.
//!
//! # Performance
//!
//! Append is amortized constant time with no element ever copied; lookup is
//! constant time but involves a leading zero count and a shift, so it will be
//! somewhat slower than `Vec`.

use crate::block::{BlockDirectory, Iter};
use crate::error::SegmentError;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;
use tracing::debug;

/// Growable array whose elements never move once written.
pub struct SegmentedGrowableArray<T> {
    blocks: BlockDirectory<T>,
    /// number of block pointers the directory has room for
    directory_size: usize,
}

impl<T> SegmentedGrowableArray<T> {
    /// Return an empty array holding a single one-element block and a
    /// directory with room for one block pointer.
    pub fn new() -> Self {
        Self::with_directory_size(1)
    }

    /// Return an empty array whose directory has room for `slots` block
    /// pointers before it needs to double.
    ///
    /// The hint counts blocks, not elements: 20 slots is enough for just over
    /// one million elements. The hint is clamped between one and the number
    /// of bits in a `usize`, since no array can ever hold more blocks.
    pub fn with_directory_size(slots: usize) -> Self {
        let directory_size = slots.clamp(1, usize::BITS as usize);
        Self {
            blocks: BlockDirectory::with_slots(directory_size),
            directory_size,
        }
    }

    /// Appends an element to the back of the array.
    ///
    /// # Panics
    ///
    /// Panics if a new block would exceed `isize::MAX` _bytes_.
    ///
    /// # Time complexity
    ///
    /// Amortized constant time.
    pub fn push(&mut self, value: T) {
        if self.blocks.is_full() {
            self.grow();
        }
        self.blocks.write(value);
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

    /// Allocate the next block, doubling the directory first if it is full.
    fn grow(&mut self) {
        let block = self.blocks.next_block();
        if block == self.directory_size {
            self.directory_size *= 2;
            self.blocks.relocate_directory(self.directory_size);
            debug!(
                blocks = block,
                directory_size = self.directory_size,
                "doubled block directory"
            );
        }
        self.blocks.grow();
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
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.blocks.get(index)
    }

    /// Returns a mutable reference to an element.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.blocks.get_mut(index)
    }

    /// Address of the element at the given index.
    ///
    /// Elements are never moved, so the pointer remains valid until the array
    /// is dropped, regardless of how many elements are pushed afterward.
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
    /// another block, always one less than a power of two.
    pub fn capacity(&self) -> usize {
        self.blocks.capacity()
    }

    /// Returns the number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.blocks.block_count()
    }

    /// Returns the number of block pointers the directory has room for.
    pub fn directory_size(&self) -> usize {
        self.directory_size
    }

    /// Returns an iterator over the array.
    ///
    /// The iterator yields all items from start to end.
    pub fn iter(&self) -> Iter<'_, T> {
        self.blocks.iter()
    }
}

impl<T> Default for SegmentedGrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for SegmentedGrowableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SegmentedGrowableArray(n: {}, c: {}, b: {}, d: {})",
            self.len(),
            self.capacity(),
            self.block_count(),
            self.directory_size
        )
    }
}

impl<T: fmt::Debug> fmt::Debug for SegmentedGrowableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for SegmentedGrowableArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        let Some(item) = self.get(index) else {
            panic!("index out of bounds: {}", index);
        };
        item
    }
}

impl<T> IndexMut<usize> for SegmentedGrowableArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let Some(item) = self.get_mut(index) else {
            panic!("index out of bounds: {}", index);
        };
        item
    }
}

impl<A> FromIterator<A> for SegmentedGrowableArray<A> {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut arr: SegmentedGrowableArray<A> = SegmentedGrowableArray::new();
        arr.extend(iter);
        arr
    }
}

impl<A> Extend<A> for SegmentedGrowableArray<A> {
    fn extend<T: IntoIterator<Item = A>>(&mut self, iter: T) {
        for value in iter {
            self.push(value)
        }
    }
}

impl<'a, T> IntoIterator for &'a SegmentedGrowableArray<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    // counts the number of times it has been dropped
    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_push_get_one_item() {
        let item = String::from("hello world");
        let mut sut: SegmentedGrowableArray<String> = SegmentedGrowableArray::new();
        assert_eq!(sut.len(), 0);
        assert!(sut.is_empty());
        sut.push(item);
        assert_eq!(sut.len(), 1);
        assert!(!sut.is_empty());
        let maybe = sut.get(0);
        assert!(maybe.is_some());
        let actual = maybe.unwrap();
        assert_eq!("hello world", actual);
        let missing = sut.get(10);
        assert!(missing.is_none());
    }

    #[test]
    fn test_push_get_several_strings() {
        let inputs = [
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
        ];
        let mut sut: SegmentedGrowableArray<String> = SegmentedGrowableArray::new();
        for item in inputs {
            sut.push(item.to_owned());
        }
        assert_eq!(sut.len(), 9);
        for (idx, item) in inputs.iter().enumerate() {
            let maybe = sut.at(idx);
            assert!(maybe.is_ok(), "{idx} is err");
            let actual = maybe.unwrap();
            assert_eq!(item, actual);
        }
        assert!(sut.get(10).is_none());
        assert_eq!(sut[3], "four");
    }

    #[test]
    fn test_push_at_boundary_counts() {
        for count in [0, 1, 2, 3, 4, 7, 8, 1023, 1024] {
            let mut sut: SegmentedGrowableArray<usize> = SegmentedGrowableArray::new();
            for value in 0..count {
                sut.push(value);
            }
            assert_eq!(sut.len(), count);
            for idx in 0..count {
                assert_eq!(sut.at(idx), Ok(&idx), "count {count}");
            }
            assert!(sut.at(count).is_err(), "count {count}");
        }
    }

    #[test]
    fn test_push_thousand_ints() {
        let mut sut: SegmentedGrowableArray<usize> = SegmentedGrowableArray::new();
        for value in 0..1000 {
            sut.push(value);
        }
        for idx in 0..1000 {
            assert_eq!(*sut.at(idx).unwrap(), idx);
        }
        assert!(sut.capacity() >= 1000);
        assert!((sut.capacity() + 1).is_power_of_two());
        assert_eq!(sut.capacity(), 1023);
        assert_eq!(sut.block_count(), 10);
    }

    #[test]
    fn test_len_and_capacity() {
        let mut sut: SegmentedGrowableArray<i32> = SegmentedGrowableArray::new();
        assert_eq!(sut.len(), 0);
        assert_eq!(sut.capacity(), 1);
        assert_eq!(sut.block_count(), 1);
        for value in 0..100 {
            sut.push(value);
            // after k blocks the capacity is 2^k - 1
            assert_eq!(sut.capacity(), (1 << sut.block_count()) - 1);
        }
        assert_eq!(sut.len(), 100);
        // 1 + 2 + 4 + 8 + 16 + 32 + 64
        assert_eq!(sut.capacity(), 127);
    }

    #[test]
    fn test_at_unwritten_and_out_of_bounds() {
        let mut sut: SegmentedGrowableArray<i32> = SegmentedGrowableArray::new();
        assert_eq!(
            sut.at(0),
            Err(SegmentError::Unwritten { index: 0, len: 0 })
        );
        for value in 0..5 {
            sut.push(value);
        }
        // blocks of 1, 2 and 4 slots are allocated
        assert_eq!(sut.capacity(), 7);
        assert_eq!(sut.at(4), Ok(&4));
        assert_eq!(
            sut.at(5),
            Err(SegmentError::Unwritten { index: 5, len: 5 })
        );
        assert_eq!(
            sut.at(6),
            Err(SegmentError::Unwritten { index: 6, len: 5 })
        );
        assert_eq!(
            sut.at(7),
            Err(SegmentError::OutOfBounds {
                index: 7,
                capacity: 7
            })
        );
        assert_eq!(
            sut.at(usize::MAX),
            Err(SegmentError::OutOfBounds {
                index: usize::MAX,
                capacity: 7
            })
        );
    }

    #[test]
    fn test_directory_doubling() {
        let mut sut: SegmentedGrowableArray<u32> = SegmentedGrowableArray::new();
        assert_eq!(sut.directory_size(), 1);
        sut.push(1);
        assert_eq!(sut.directory_size(), 1);
        // second block needs a second slot
        sut.push(2);
        assert_eq!(sut.directory_size(), 2);
        assert_eq!(sut.block_count(), 2);
        sut.push(3);
        sut.push(4);
        assert_eq!(sut.directory_size(), 4);
        assert_eq!(sut.block_count(), 3);
        for value in 5..=15 {
            sut.push(value);
        }
        assert_eq!(sut.block_count(), 4);
        assert_eq!(sut.directory_size(), 4);
        sut.push(16);
        assert_eq!(sut.block_count(), 5);
        assert_eq!(sut.directory_size(), 8);
    }

    #[test]
    fn test_with_directory_size() {
        let mut sut: SegmentedGrowableArray<u32> = SegmentedGrowableArray::with_directory_size(10);
        assert_eq!(sut.directory_size(), 10);
        for value in 0..1023 {
            sut.push(value);
        }
        // ten blocks fit without doubling
        assert_eq!(sut.block_count(), 10);
        assert_eq!(sut.directory_size(), 10);
        sut.push(1023);
        assert_eq!(sut.directory_size(), 20);

        let sut: SegmentedGrowableArray<u32> = SegmentedGrowableArray::with_directory_size(0);
        assert_eq!(sut.directory_size(), 1);
    }

    #[test]
    fn test_huge_directory_size_hint() {
        let bits = usize::BITS as usize;
        let mut sut: SegmentedGrowableArray<u8> =
            SegmentedGrowableArray::with_directory_size(usize::MAX);
        assert_eq!(sut.directory_size(), bits);
        let mut sut2: SegmentedGrowableArray<u8> =
            SegmentedGrowableArray::with_directory_size(usize::MAX / 2);
        assert_eq!(sut2.directory_size(), bits);
        for value in 0..200u8 {
            sut.push(value);
            sut2.push(value);
        }
        for idx in 0..200 {
            assert_eq!(sut.at(idx), Ok(&(idx as u8)));
            assert_eq!(sut2.at(idx), Ok(&(idx as u8)));
        }
        assert_eq!(sut.directory_size(), bits);
    }

    #[test]
    fn test_drop_runs_once_per_element() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut sut: SegmentedGrowableArray<Tracked> = SegmentedGrowableArray::new();
            // blocks 0 through 10, last one partially written
            for _ in 0..1_500 {
                sut.push(Tracked(drops.clone()));
            }
            assert_eq!(sut.block_count(), 11);
            assert_eq!(sut.directory_size(), 16);
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 1_500);
    }

    #[test]
    fn test_directory_growth_keeps_addresses() {
        let mut sut: SegmentedGrowableArray<u64> = SegmentedGrowableArray::new();
        for value in 0..15 {
            sut.push(value);
        }
        assert_eq!(sut.directory_size(), 4);
        let before: Vec<NonNull<u64>> = (0..15)
            .map(|i| sut.element_ptr(i).unwrap())
            .collect();
        // needs a fifth block and therefore a larger directory
        sut.push(15);
        assert_eq!(sut.directory_size(), 8);
        for (idx, ptr) in before.iter().enumerate() {
            assert_eq!(sut.element_ptr(idx), Some(*ptr));
            assert_eq!(unsafe { *ptr.as_ptr() }, idx as u64);
        }
        for value in 16..100_000 {
            sut.push(value);
        }
        for (idx, ptr) in before.iter().enumerate() {
            assert_eq!(sut.element_ptr(idx), Some(*ptr));
        }
        assert!(sut.element_ptr(100_000).is_none());
    }

    #[test]
    fn test_push_within_capacity() {
        let mut sut: SegmentedGrowableArray<u32> = SegmentedGrowableArray::new();
        // block zero is allocated at construction
        assert_eq!(sut.push_within_capacity(101), Ok(()));
        assert_eq!(sut.push_within_capacity(102), Err(102));
        sut.push(10);
        assert_eq!(sut.push_within_capacity(103), Ok(()));
        assert_eq!(sut.push_within_capacity(104), Err(104));
        assert_eq!(sut.len(), 3);
        assert_eq!(sut[2], 103);
    }

    #[test]
    fn test_get_mut_index_mut() {
        let mut sut: SegmentedGrowableArray<String> = SegmentedGrowableArray::new();
        sut.push(String::from("first"));
        sut.push(String::from("second"));
        sut.push(String::from("third"));
        if let Some(value) = sut.get_mut(1) {
            value.push_str(" place");
        } else {
            panic!("get_mut() returned None")
        }
        assert_eq!(sut[1], "second place");
        sut[2] = "third planet".into();
        assert_eq!(sut[2], "third planet");
        assert!(sut.get_mut(3).is_none());
    }

    #[test]
    #[should_panic(expected = "index out of bounds:")]
    fn test_index_out_of_bounds() {
        let mut sut: SegmentedGrowableArray<i32> = SegmentedGrowableArray::new();
        sut.push(10);
        sut.push(20);
        let _ = sut[2];
    }

    #[test]
    #[should_panic(expected = "index out of bounds:")]
    fn test_index_mut_out_of_bounds() {
        let mut sut: SegmentedGrowableArray<i32> = SegmentedGrowableArray::new();
        sut.push(10);
        sut.push(20);
        sut[2] = 30;
    }

    #[test]
    fn test_push_get_thousands_structs() {
        struct MyData {
            a: u64,
            b: i32,
        }
        let mut sut: SegmentedGrowableArray<MyData> = SegmentedGrowableArray::new();
        for value in 0..88_888i32 {
            sut.push(MyData {
                a: value as u64,
                b: value,
            });
        }
        assert_eq!(sut.len(), 88_888);
        for idx in 0..88_888i32 {
            let maybe = sut.get(idx as usize);
            assert!(maybe.is_some(), "{idx} is none");
            let actual = maybe.unwrap();
            assert_eq!(idx as u64, actual.a);
            assert_eq!(idx, actual.b);
        }
    }

    #[test]
    fn test_from_iterator_and_extend() {
        let sut: SegmentedGrowableArray<i32> = (0..10_000).collect();
        assert_eq!(sut.len(), 10_000);
        for idx in 0..10_000i32 {
            assert_eq!(sut.get(idx as usize), Some(&idx));
        }
        let mut sut = sut;
        sut.extend(10_000..10_010);
        assert_eq!(sut.len(), 10_010);
        assert_eq!(sut[10_009], 10_009);
    }

    #[test]
    fn test_push_get_many_ints() {
        let mut sut: SegmentedGrowableArray<i32> = SegmentedGrowableArray::new();
        for value in 0..1_000_000 {
            sut.push(value);
        }
        assert_eq!(sut.len(), 1_000_000);
        for idx in 0..1_000_000 {
            let maybe = sut.get(idx);
            assert!(maybe.is_some(), "{idx} is none");
            let actual = maybe.unwrap();
            assert_eq!(idx, *actual as usize);
        }
        assert_eq!(sut[99_999], 99_999);
        assert_eq!(sut.capacity(), 1_048_575);
    }

    #[test]
    fn test_iterator() {
        let inputs = [
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
        ];
        let mut sut: SegmentedGrowableArray<String> = SegmentedGrowableArray::new();
        for item in inputs {
            sut.push(item.to_owned());
        }
        for (idx, elem) in sut.iter().enumerate() {
            assert_eq!(inputs[idx], elem);
        }
        let mut count = 0;
        for elem in &sut {
            assert_eq!(inputs[count], elem);
            count += 1;
        }
        assert_eq!(count, 9);
    }

    #[test]
    fn test_display_and_debug() {
        let sut: SegmentedGrowableArray<i32> = (1..=4).collect();
        assert_eq!(
            sut.to_string(),
            "SegmentedGrowableArray(n: 4, c: 7, b: 3, d: 4)"
        );
        assert_eq!(format!("{:?}", sut), "[1, 2, 3, 4]");
    }

    #[test]
    fn test_push_get_many_instances_strings() {
        // test allocating, filling, and then dropping many instances
        for _ in 0..1_000 {
            let mut sut: SegmentedGrowableArray<String> = SegmentedGrowableArray::new();
            for _ in 0..1_000 {
                let value = ulid::Ulid::new().to_string();
                sut.push(value);
            }
            assert_eq!(sut.len(), 1_000);
        }
    }

    #[test]
    fn test_zero_sized_type() {
        let mut sut: SegmentedGrowableArray<()> = SegmentedGrowableArray::new();
        for _ in 0..5_000 {
            sut.push(());
        }
        assert_eq!(sut.len(), 5_000);
        assert_eq!(sut.at(4_999), Ok(&()));
        assert_eq!(sut.iter().count(), 5_000);
    }

    proptest! {
        #[test]
        fn pushed_values_read_back(values in proptest::collection::vec(any::<i64>(), 0..3000)) {
            let sut: SegmentedGrowableArray<i64> = values.iter().copied().collect();
            prop_assert_eq!(sut.len(), values.len());
            prop_assert!(sut.capacity() >= values.len());
            prop_assert!((sut.capacity() + 1).is_power_of_two());
            for (idx, value) in values.iter().enumerate() {
                prop_assert_eq!(sut.at(idx), Ok(value));
            }
            prop_assert!(sut.at(values.len()).is_err());
        }
    }
}
