//
// Copyright (c) 2025 Nathan Fiedler
//

//! Index arithmetic shared by both array variants.
//!
//! Block `b` holds `2^b` elements, so after `k` blocks have been allocated the
//! array can hold `2^k - 1` elements. A logical index `i` is mapped to a block
//! and an offset by looking at `i + 1`: its highest set bit selects the block
//! and the remaining bits are the offset within that block.

/// Compute `floor(log2(n))` using the leading zero count of `n`.
///
/// The argument must be non-zero; every caller in this crate adds one to an
/// index before taking the logarithm.
///
/// # Time complexity
///
/// Constant time.
#[inline]
pub const fn log2(n: usize) -> usize {
    debug_assert!(n != 0, "log2 of zero is undefined");
    (usize::BITS - 1 - n.leading_zeros()) as usize
}

/// Number of elements held by the block at position `block` in the directory.
#[inline]
pub const fn block_capacity(block: usize) -> usize {
    1 << block
}

/// Total number of elements held by the first `blocks` blocks, saturating at
/// `usize::MAX`.
#[inline]
pub const fn capacity_for_blocks(blocks: usize) -> usize {
    if blocks >= usize::BITS as usize {
        usize::MAX
    } else {
        (1 << blocks) - 1
    }
}

/// Map a zero-based logical index to its `(block, offset)` pair.
///
/// The mapping is a bijection between `0..2^k - 1` and the slots of the first
/// `k` blocks, and `offset < block_capacity(block)` always holds.
///
/// # Time complexity
///
/// Constant time.
#[inline]
pub const fn locate(index: usize) -> (usize, usize) {
    let n = index + 1;
    let block = log2(n);
    (block, n - block_capacity(block))
}
