//! # `wavefront` - Exhaustive Search over Perfectly-Hashed State Spaces
//!
//! A framework for exhaustive breadth-first exploration of single-agent
//! puzzles whose reachable configurations are combinatorially huge but
//! enumerable. Its distinctive piece is a perfect-hash state codec: a
//! bijection between configurations and a dense integer range `[0, N)`,
//! which lets visitedness live in one bit per state and frontiers stream
//! to disk as fixed-width records.
//!
//! ## Key Features
//!
//! - **Permutation-rank codec**: two-symbol multinomial ranking over a
//!   precomputed Pascal table, composed layer by layer in mixed radix
//! - **Four engines, one contract**: in-memory parent-linked BFS, delayed
//!   duplicate detection, disk-swapping BFS, and a multithreaded disk
//!   variant with per-partition locks
//! - **Deadlock-pruned Sokoban**: pull-analysis dead floor, 2×2 and
//!   N-pattern freezes, goal-corridor rejection
//! - **Pluggable domains**: n-puzzle and plank puzzles ride the same
//!   [`domain::Domain`] interface
//!
//! ## Example
//!
//! ```rust
//! use wavefront::domain::sokoban::Sokoban;
//! use wavefront::engine::{MemBfs, MemOptions};
//!
//! let instance = "size 5 3\nmap\n#####\n#@$.#\n#####\n";
//! let domain = Sokoban::load(instance).unwrap();
//! let outcome = MemBfs::solve(&domain, &MemOptions::default()).unwrap();
//!
//! assert_eq!(outcome.solution_length(), Some(1));
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]

pub mod codec;
pub mod domain;
pub mod engine;
pub mod error;
pub mod report;

pub use domain::{Domain, Successor};
pub use engine::{DddBfs, DiskBfs, MemBfs, ParallelBfs, SearchOutcome};
pub use error::{Result, SolveError};
