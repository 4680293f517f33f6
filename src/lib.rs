//
// Copyright (c) 2025 Nathan Fiedler
//

//! Growable arrays that never move an element once it has been written.
//!
//! A conventional vector reallocates and copies every element when it runs
//! out of room. The arrays in this crate instead keep a directory of
//! independently allocated blocks, where block `b` holds `2^b` elements.
//! When the blocks are full a new block as large as all previous blocks
//! combined (plus one) is allocated, so appends remain amortized constant
//! time while existing elements stay at the same address for the lifetime of
//! the array.
//!
//! Two variants are provided:
//!
//! * [`SegmentedGrowableArray`] doubles its block directory whenever it
//!   fills up, copying only the block pointers.
//! * [`SegmentedFixedDirectoryArray`] sizes its directory once, for a
//!   caller-declared maximum number of blocks, and reports an error when
//!   that limit is reached.
//!
//! A logical index `i` maps to block `log2(i + 1)` at offset
//! `i + 1 - 2^block`; see the [`math`] module.
//!
//! # Memory Usage
//!
//! At most half of the allocated slots are unused at any time, and the
//! directory holds O(log N) pointers.
//!
//! # Safety
//!
//! Because this data structure is allocating memory and writing values using
//! pointers, there are `unsafe` blocks in the block directory code. Only
//! written slots are ever read or dropped.

mod block;
pub mod error;
mod fixed;
mod growable;
pub mod math;

pub use block::Iter;
pub use error::SegmentError;
pub use fixed::SegmentedFixedDirectoryArray;
pub use growable::SegmentedGrowableArray;
pub use math::log2;
