//
// Copyright (c) 2025 Nathan Fiedler
//

//! Error type for the segmented arrays.

use std::error::Error;
use std::fmt;

/// Errors that can occur when reading from or appending to an array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentError {
    /// The index lies beyond every allocated block.
    OutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of slots across all allocated blocks.
        capacity: usize,
    },
    /// The index refers to an allocated slot that has not been written yet.
    Unwritten {
        /// The requested index.
        index: usize,
        /// Number of elements written to the array.
        len: usize,
    },
    /// A pre-sized array needed a block beyond its declared maximum.
    DirectoryExhausted {
        /// The block count given at construction.
        max_blocks: usize,
    },
    /// A pre-sized array was constructed with an unusable block count.
    InvalidMaxBlocks {
        /// The rejected block count.
        max_blocks: usize,
    },
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, capacity } => {
                write!(f, "index {index} out of bounds for capacity {capacity}")
            }
            Self::Unwritten { index, len } => {
                write!(f, "index {index} has not been written (len is {len})")
            }
            Self::DirectoryExhausted { max_blocks } => {
                write!(f, "block directory exhausted: all {max_blocks} blocks in use")
            }
            Self::InvalidMaxBlocks { max_blocks } => {
                write!(
                    f,
                    "max blocks must be between 1 and {} (is {max_blocks})",
                    usize::BITS
                )
            }
        }
    }
}

impl Error for SegmentError {}
