//! Bit-per-state visited sets, partitioned and lazily allocated.
//!
//! The N-bit array is divided into 2^m-bit blocks; a block is
//! zero-allocated the first time any of its bits is written, so bitmap
//! memory tracks the states actually touched rather than N. No block is
//! ever freed during a run.

use std::sync::Mutex;

use crossbeam_utils::CachePadded;

use crate::error::{Result, SolveError};

/// Bits per `u64` word.
const WORD_BITS: u64 = 64;

fn block_geometry(n_bits: u64, exponent: u32) -> Result<(u64, usize, usize)> {
    if exponent >= 64 {
        return Err(SolveError::TooLarge(format!(
            "partition exponent {exponent} out of range"
        )));
    }
    // Exponent 0 selects one unpartitioned block spanning all of N.
    let block_bits = if exponent == 0 {
        n_bits.max(1)
    } else {
        1u64 << exponent
    };
    let nblocks = usize::try_from(n_bits.div_ceil(block_bits).max(1))
        .map_err(|_| SolveError::TooLarge("partition count exceeds memory addressing".into()))?;
    let block_words = usize::try_from(block_bits.div_ceil(WORD_BITS))
        .map_err(|_| SolveError::TooLarge("partition size exceeds memory addressing".into()))?;
    Ok((block_bits, nblocks, block_words))
}

fn new_block(block_words: usize) -> Box<[u64]> {
    vec![0u64; block_words].into_boxed_slice()
}

/// Serial lazily allocated partitioned bitmap.
pub struct PartitionedBitmap {
    block_bits: u64,
    block_words: usize,
    blocks: Vec<Option<Box<[u64]>>>,
    n_bits: u64,
}

impl PartitionedBitmap {
    /// Creates an all-unset bitmap over `n_bits` states with 2^`exponent`
    /// bits per block (0 = one unpartitioned block).
    pub fn new(n_bits: u64, exponent: u32) -> Result<Self> {
        let (block_bits, nblocks, block_words) = block_geometry(n_bits, exponent)?;
        Ok(Self {
            block_bits,
            block_words,
            blocks: (0..nblocks).map(|_| None).collect(),
            n_bits,
        })
    }

    /// Sets the bit, returning `true` when this call observed it unset.
    /// Allocates the bit's block on first touch.
    pub fn test_and_set(&mut self, bit: u64) -> bool {
        debug_assert!(bit < self.n_bits);
        let block = (bit / self.block_bits) as usize;
        let offset = bit % self.block_bits;
        let words = self.blocks[block].get_or_insert_with(|| new_block(self.block_words));
        let word = &mut words[(offset / WORD_BITS) as usize];
        let mask = 1u64 << (offset % WORD_BITS);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    /// Whether the bit is set; never allocates.
    pub fn is_set(&self, bit: u64) -> bool {
        debug_assert!(bit < self.n_bits);
        let block = (bit / self.block_bits) as usize;
        let offset = bit % self.block_bits;
        match &self.blocks[block] {
            None => false,
            Some(words) => {
                words[(offset / WORD_BITS) as usize] & (1u64 << (offset % WORD_BITS)) != 0
            }
        }
    }

    /// Blocks that have been allocated so far.
    pub fn allocated_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }
}

/// Parallel variant: one independent mutex per block, so the block count
/// trades memory for lock contention.
pub struct SharedBitmap {
    block_bits: u64,
    block_words: usize,
    blocks: Vec<CachePadded<Mutex<Option<Box<[u64]>>>>>,
    n_bits: u64,
}

impl SharedBitmap {
    /// See [`PartitionedBitmap::new`].
    pub fn new(n_bits: u64, exponent: u32) -> Result<Self> {
        let (block_bits, nblocks, block_words) = block_geometry(n_bits, exponent)?;
        Ok(Self {
            block_bits,
            block_words,
            blocks: (0..nblocks)
                .map(|_| CachePadded::new(Mutex::new(None)))
                .collect(),
            n_bits,
        })
    }

    /// Sets the bit under its block's lock, returning `true` when this
    /// call won the visit.
    pub fn test_and_set(&self, bit: u64) -> bool {
        debug_assert!(bit < self.n_bits);
        let block = (bit / self.block_bits) as usize;
        let offset = bit % self.block_bits;
        let mut guard = self.blocks[block].lock().expect("bitmap lock poisoned");
        let words = guard.get_or_insert_with(|| new_block(self.block_words));
        let word = &mut words[(offset / WORD_BITS) as usize];
        let mask = 1u64 << (offset % WORD_BITS);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }
}
