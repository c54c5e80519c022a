//! The contract between puzzle domains and search engines.
//!
//! A domain owns the immutable instance topology and the codec wiring; the
//! engine owns traversal order, visitedness, and frontier storage. Each
//! concurrent worker holds its own mutable [`Domain::Config`], so
//! encode/decode/expansion never contend on shared configuration state.

pub mod npuzzle;
pub mod parse;
pub mod plank;
pub mod sokoban;

use crate::codec::StateSpace;
use crate::error::Result;

/// One successor produced by [`Domain::expand`].
///
/// The goal flag is computed while the domain still holds the child
/// configuration, so engines never re-decode a child just to test the win
/// predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Successor {
    /// Encoded rank of the child state.
    pub rank: u64,
    /// Whether the child satisfies the goal predicate.
    pub is_goal: bool,
}

/// A puzzle domain drivable by every engine in this crate.
///
/// Implementations guarantee the codec bijection: for every reachable
/// configuration C, `decode(encode(C))` reproduces C and `encode(C)` lies
/// in `[0, N)`. Unreachable ranks may exist (deadlocked placements) but
/// never affect round-tripping of reachable ones.
pub trait Domain {
    /// Mutable per-worker configuration.
    type Config: Clone + Send;

    /// Dimensions of the encoded state space (N − 1 and the serialized
    /// byte width).
    fn space(&self) -> StateSpace;

    /// A fresh configuration positioned at the instance's start state.
    fn start(&self) -> Self::Config;

    /// Ranks the configuration.
    ///
    /// A produced rank ≥ N is an invariant breach and yields an error.
    fn encode(&self, cfg: &Self::Config) -> Result<u64>;

    /// Replaces the configuration with the decoded `rank`.
    fn decode(&self, rank: u64, cfg: &mut Self::Config) -> Result<()>;

    /// Appends every legal successor of the current configuration to `out`.
    ///
    /// The configuration is restored before returning; `out` is not
    /// cleared. Successors may repeat ranks; engines deduplicate through
    /// their visited structures.
    fn expand(&self, cfg: &mut Self::Config, out: &mut Vec<Successor>) -> Result<()>;

    /// Whether the configuration satisfies the goal predicate.
    fn is_goal(&self, cfg: &Self::Config) -> bool;

    /// Human-readable snapshot, used when printing solutions.
    fn render(&self, cfg: &Self::Config) -> String;
}
