//! Disk-swapping BFS: visitedness in a lazily allocated partitioned
//! bitmap, frontiers in per-generation files.
//!
//! Generation g is read linearly through the in-buffer while its children
//! stream through the out-buffer into `GEN-(g+1)`. Solutions are
//! reconstructed backward by re-reading `GEN-g … GEN-0` and re-expanding
//! candidate parents, trading repeated neighbour enumeration for not
//! storing parent links at all.

use std::path::PathBuf;

use crate::domain::{Domain, Successor};
use crate::engine::frontier::{FrontierReader, FrontierWriter};
use crate::engine::visited::PartitionedBitmap;
use crate::engine::SearchOutcome;
use crate::error::{Result, SolveError};

/// Options for [`DiskBfs`].
#[derive(Debug, Clone)]
pub struct DiskOptions {
    /// Directory receiving the `GEN-DDDD` files. The engine leaves the
    /// files behind for inspection and reuse.
    pub dir: PathBuf,
    /// Visited-bitmap partition exponent m (2^m bits per block, 0 = one
    /// unpartitioned block).
    pub block_exponent: u32,
    /// In-buffer budget in bytes for reading the previous generation.
    pub in_buffer: usize,
    /// Out-buffer budget in bytes for accumulating the next generation.
    pub out_buffer: usize,
    /// Stop after the generation in which a goal state is discovered.
    pub stop_on_goal: bool,
}

impl DiskOptions {
    /// Reasonable defaults writing into `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            block_exponent: 20,
            in_buffer: 1 << 20,
            out_buffer: 1 << 20,
            stop_on_goal: true,
        }
    }
}

/// The serial disk engine.
pub struct DiskBfs;

impl DiskBfs {
    /// Runs the search from the domain's start state.
    pub fn solve<D: Domain>(domain: &D, opts: &DiskOptions) -> Result<SearchOutcome> {
        let space = domain.space();
        let state_size = space.state_size();
        let n_bits = space
            .count()
            .ok_or_else(|| SolveError::TooLarge("state count exceeds the bitmap".into()))?;
        let mut visited = PartitionedBitmap::new(n_bits, opts.block_exponent)?;

        let mut cfg = domain.start();
        let mut succ: Vec<Successor> = Vec::new();
        let start = domain.encode(&cfg)?;

        let mut writer = FrontierWriter::create(&opts.dir, 0, state_size, opts.out_buffer)?;
        writer.push(start)?;
        writer.finish()?;
        visited.test_and_set(start);

        let mut reachable = 1u64;
        let mut generations = vec![1u64];
        let mut goal: Option<(u64, u32)> = None;
        if domain.is_goal(&cfg) {
            goal = Some((start, 0));
        }

        let mut chunk: Vec<u64> = Vec::new();
        let mut g = 0u32;
        while goal.map_or(true, |_| !opts.stop_on_goal) {
            let mut reader = FrontierReader::open(&opts.dir, g, state_size, opts.in_buffer)?;
            let mut writer = FrontierWriter::create(&opts.dir, g + 1, state_size, opts.out_buffer)?;

            // A goal may surface mid-generation; the generation is still
            // driven to completion so GEN files stay depth-exact.
            while reader.read_chunk(&mut chunk)? > 0 {
                for &parent in &chunk {
                    domain.decode(parent, &mut cfg)?;
                    succ.clear();
                    domain.expand(&mut cfg, &mut succ)?;
                    for s in &succ {
                        if !visited.test_and_set(s.rank) {
                            continue;
                        }
                        reachable += 1;
                        if s.is_goal && goal.is_none() {
                            goal = Some((s.rank, g + 1));
                        }
                        writer.push(s.rank)?;
                    }
                }
            }

            let written = writer.finish()?;
            tracing::debug!(generation = g + 1, states = written, "generation flushed");
            if written == 0 {
                break;
            }
            generations.push(written);
            g += 1;
        }

        let solution = match goal {
            None => None,
            Some((rank, depth)) => {
                Some(reconstruct(domain, &opts.dir, opts.in_buffer, rank, depth)?)
            }
        };

        tracing::debug!(
            reachable,
            depth = generations.len() - 1,
            blocks = visited.allocated_blocks(),
            solved = goal.is_some(),
            "disk search finished"
        );
        Ok(SearchOutcome {
            reachable,
            generations,
            goal_depth: goal.map(|(_, d)| d),
            solution,
        })
    }
}

/// Backward reconstruction over retained generation files: for each
/// generation from the goal's downward, the first state whose expansion
/// reaches the current target is its parent.
pub(crate) fn reconstruct<D: Domain>(
    domain: &D,
    dir: &std::path::Path,
    in_buffer: usize,
    goal: u64,
    goal_depth: u32,
) -> Result<Vec<u64>> {
    let state_size = domain.space().state_size();
    let mut path = vec![goal];
    let mut target = goal;
    let mut cfg = domain.start();
    let mut succ: Vec<Successor> = Vec::new();
    let mut chunk: Vec<u64> = Vec::new();

    for g in (0..goal_depth).rev() {
        let mut reader = FrontierReader::open(dir, g, state_size, in_buffer)?;
        let mut found = false;
        'generation: while reader.read_chunk(&mut chunk)? > 0 {
            for &candidate in &chunk {
                domain.decode(candidate, &mut cfg)?;
                succ.clear();
                domain.expand(&mut cfg, &mut succ)?;
                if succ.iter().any(|s| s.rank == target) {
                    path.push(candidate);
                    target = candidate;
                    found = true;
                    break 'generation;
                }
            }
        }
        if !found {
            return Err(SolveError::Invariant(format!(
                "no parent for state {target} in generation {g}"
            )));
        }
    }

    path.reverse();
    Ok(path)
}
