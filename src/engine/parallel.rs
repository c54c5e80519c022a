//! Multithreaded disk BFS: T workers, one master, a generation barrier.
//!
//! The master performs all file I/O. Each in-buffer chunk is published to
//! the workers through a barrier round trip: the master fills the chunk
//! while every worker is parked at the barrier, releases them, and waits
//! at the barrier again for the chunk to drain. Worker i expands every
//! T-th record of the chunk. Visited bits are taken under their block's
//! mutex, the out-buffer under the flush lock, and the winning state under
//! the solution lock, so the set of states discovered per generation is
//! identical to the serial engine's; only the order within a generation
//! file is scheduling-dependent.

use std::path::PathBuf;
use std::sync::{Barrier, Mutex, RwLock};

use crate::domain::{Domain, Successor};
use crate::engine::disk::reconstruct;
use crate::engine::frontier::{FrontierReader, FrontierWriter};
use crate::engine::visited::SharedBitmap;
use crate::engine::SearchOutcome;
use crate::error::{Result, SolveError};

/// Options for [`ParallelBfs`].
#[derive(Debug, Clone)]
pub struct ParallelOptions {
    /// Directory receiving the `GEN-DDDD` files.
    pub dir: PathBuf,
    /// Worker thread count T (the master is not counted).
    pub threads: usize,
    /// Visited-bitmap partition exponent m; also the lock granularity.
    pub block_exponent: u32,
    /// In-buffer budget in bytes.
    pub in_buffer: usize,
    /// Out-buffer budget in bytes.
    pub out_buffer: usize,
    /// Stop after the generation in which a goal state is discovered.
    pub stop_on_goal: bool,
}

impl ParallelOptions {
    /// Defaults for `threads` workers writing into `dir`.
    pub fn new(dir: PathBuf, threads: usize) -> Self {
        Self {
            dir,
            threads,
            block_exponent: 20,
            in_buffer: 1 << 20,
            out_buffer: 1 << 20,
            stop_on_goal: true,
        }
    }
}

/// What the master has published for the workers.
enum Phase {
    /// Expand the chunk; children belong to `depth`.
    Expand,
    /// Search over; workers exit.
    Done,
}

struct Shared {
    phase: Phase,
    depth: u32,
    chunk: Vec<u64>,
}

/// The multithreaded disk engine.
pub struct ParallelBfs;

impl ParallelBfs {
    /// Runs the search from the domain's start state.
    pub fn solve<D>(domain: &D, opts: &ParallelOptions) -> Result<SearchOutcome>
    where
        D: Domain + Sync,
    {
        if opts.threads == 0 {
            return Err(SolveError::Capacity("at least one worker is required".into()));
        }
        let space = domain.space();
        let n_bits = space
            .count()
            .ok_or_else(|| SolveError::TooLarge("state count exceeds the bitmap".into()))?;

        let visited = SharedBitmap::new(n_bits, opts.block_exponent)?;
        let shared = RwLock::new(Shared {
            phase: Phase::Expand,
            depth: 0,
            chunk: Vec::new(),
        });
        let sink: Mutex<Option<FrontierWriter>> = Mutex::new(None);
        let solution_lock: Mutex<Option<(u64, u32)>> = Mutex::new(None);
        let failure: Mutex<Option<SolveError>> = Mutex::new(None);
        let barrier = Barrier::new(opts.threads + 1);

        let cfg = domain.start();
        let start = domain.encode(&cfg)?;
        if domain.is_goal(&cfg) {
            *solution_lock.lock().expect("solution lock poisoned") = Some((start, 0));
        }

        let outcome = std::thread::scope(|scope| {
            for worker_id in 0..opts.threads {
                let shared = &shared;
                let barrier = &barrier;
                let visited = &visited;
                let sink = &sink;
                let solution_lock = &solution_lock;
                let failure = &failure;
                scope.spawn(move || {
                    worker_loop(
                        domain,
                        worker_id,
                        opts.threads,
                        shared,
                        barrier,
                        visited,
                        sink,
                        solution_lock,
                        failure,
                    );
                });
            }

            let result = master_loop(domain, opts, start, &shared, &barrier, &visited, &sink, &solution_lock, &failure);

            // Release the workers whether the search succeeded or not;
            // they are parked at the barrier whenever the master runs.
            shared.write().expect("shared state poisoned").phase = Phase::Done;
            barrier.wait();
            result
        })?;

        let goal = *solution_lock.lock().expect("solution lock poisoned");
        let solution = match goal {
            None => None,
            Some((rank, depth)) => {
                Some(reconstruct(domain, &opts.dir, opts.in_buffer, rank, depth)?)
            }
        };
        tracing::debug!(
            reachable = outcome.reachable,
            depth = outcome.generations.len() - 1,
            threads = opts.threads,
            solved = goal.is_some(),
            "parallel search finished"
        );
        Ok(SearchOutcome {
            goal_depth: goal.map(|(_, d)| d),
            solution,
            ..outcome
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn master_loop<D: Domain + Sync>(
    domain: &D,
    opts: &ParallelOptions,
    start: u64,
    shared: &RwLock<Shared>,
    barrier: &Barrier,
    visited: &SharedBitmap,
    sink: &Mutex<Option<FrontierWriter>>,
    solution_lock: &Mutex<Option<(u64, u32)>>,
    failure: &Mutex<Option<SolveError>>,
) -> Result<SearchOutcome> {
    let state_size = domain.space().state_size();

    let mut writer = FrontierWriter::create(&opts.dir, 0, state_size, opts.out_buffer)?;
    writer.push(start)?;
    writer.finish()?;
    visited.test_and_set(start);

    let mut reachable = 1u64;
    let mut generations = vec![1u64];

    let mut g = 0u32;
    loop {
        {
            let has_goal = solution_lock
                .lock()
                .expect("solution lock poisoned")
                .is_some();
            if has_goal && opts.stop_on_goal {
                break;
            }
        }
        let mut reader = FrontierReader::open(&opts.dir, g, state_size, opts.in_buffer)?;
        *sink.lock().expect("flush lock poisoned") =
            Some(FrontierWriter::create(&opts.dir, g + 1, state_size, opts.out_buffer)?);

        loop {
            // Workers are parked at the barrier; the chunk is the
            // master's to refill.
            let n = {
                let mut sh = shared.write().expect("shared state poisoned");
                sh.depth = g + 1;
                reader.read_chunk(&mut sh.chunk)?
            };
            if n == 0 {
                break;
            }
            barrier.wait();
            barrier.wait();
            if let Some(err) = failure.lock().expect("failure slot poisoned").take() {
                return Err(err);
            }
        }

        let written = sink
            .lock()
            .expect("flush lock poisoned")
            .take()
            .map(FrontierWriter::finish)
            .transpose()?
            .unwrap_or(0);
        tracing::debug!(generation = g + 1, states = written, "generation flushed");
        if written == 0 {
            break;
        }
        reachable += written;
        generations.push(written);
        g += 1;
    }

    Ok(SearchOutcome {
        reachable,
        generations,
        goal_depth: None,
        solution: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn worker_loop<D: Domain>(
    domain: &D,
    worker_id: usize,
    threads: usize,
    shared: &RwLock<Shared>,
    barrier: &Barrier,
    visited: &SharedBitmap,
    sink: &Mutex<Option<FrontierWriter>>,
    solution_lock: &Mutex<Option<(u64, u32)>>,
    failure: &Mutex<Option<SolveError>>,
) {
    let mut cfg = domain.start();
    let mut succ: Vec<Successor> = Vec::new();
    loop {
        barrier.wait();
        let guard = shared.read().expect("shared state poisoned");
        match guard.phase {
            Phase::Done => return,
            Phase::Expand => {
                let depth = guard.depth;
                let outcome = expand_share(
                    domain,
                    &guard.chunk,
                    worker_id,
                    threads,
                    depth,
                    &mut cfg,
                    &mut succ,
                    visited,
                    sink,
                    solution_lock,
                );
                if let Err(err) = outcome {
                    failure
                        .lock()
                        .expect("failure slot poisoned")
                        .get_or_insert(err);
                }
                drop(guard);
                barrier.wait();
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn expand_share<D: Domain>(
    domain: &D,
    chunk: &[u64],
    worker_id: usize,
    threads: usize,
    depth: u32,
    cfg: &mut D::Config,
    succ: &mut Vec<Successor>,
    visited: &SharedBitmap,
    sink: &Mutex<Option<FrontierWriter>>,
    solution_lock: &Mutex<Option<(u64, u32)>>,
) -> Result<()> {
    for idx in (worker_id..chunk.len()).step_by(threads) {
        domain.decode(chunk[idx], cfg)?;
        succ.clear();
        domain.expand(cfg, succ)?;
        for s in &*succ {
            if !visited.test_and_set(s.rank) {
                continue;
            }
            if s.is_goal {
                solution_lock
                    .lock()
                    .expect("solution lock poisoned")
                    .get_or_insert((s.rank, depth));
            }
            let mut guard = sink.lock().expect("flush lock poisoned");
            let writer = guard.as_mut().ok_or_else(|| {
                SolveError::Invariant("out-buffer missing during expansion".into())
            })?;
            writer.push(s.rank)?;
        }
    }
    Ok(())
}
