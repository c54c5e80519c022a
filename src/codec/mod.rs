//! Bijective state codec: a perfect hash between reachable puzzle
//! configurations and the dense integer range `[0, N)`.
//!
//! The codec is built from three primitives:
//!
//! - [`PascalTable`]: precomputed binomial coefficients with a
//!   floating-point overflow cross-check,
//! - two-symbol multinomial ranking ([`rank_ones`] / [`UnrankOnes`]) for
//!   binary occupancy layers,
//! - mixed-radix layer composition ([`StateSpace`], [`RadixBuilder`]) that
//!   multiplies independent sub-encodings into one rank.
//!
//! Domains wire these together; engines only ever see the resulting `u64`
//! ranks and their little-endian serialized width.

pub mod binary;
pub mod factorial;
pub mod pascal;
pub mod radix;

pub use binary::{rank_ones, UnrankOnes};
pub use factorial::{factorial, rank_permutation, unrank_permutation};
pub use pascal::PascalTable;
pub use radix::{state_size_for, RadixBuilder, StateSpace};
