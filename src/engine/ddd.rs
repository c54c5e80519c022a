//! In-memory BFS with delayed duplicate detection.
//!
//! One contiguous rank buffer holds three runs: `prevprev` (everything two
//! or more generations back), `prev` (the generation being expanded), and
//! `cur` (the generation under construction). Each run is sorted and
//! duplicate-free; children are appended to `cur` verbatim and reconciled
//! in bulk, so no bit-per-state structure is needed. Little-endian byte
//! comparison of serialized states orders them exactly like their `u64`
//! values, so numeric sorting preserves the run discipline.
//!
//! Parent links are not stored; this engine reports the goal depth but
//! cannot print a solution.

use crate::domain::{Domain, Successor};
use crate::engine::SearchOutcome;
use crate::error::{Result, SolveError};

/// Options for [`DddBfs`].
#[derive(Debug, Clone)]
pub struct DddOptions {
    /// Buffer capacity in records; bounds the deepest reachable search.
    pub capacity: usize,
    /// For undirected bipartite graphs the cumulative history can be
    /// dropped at each rollover: only the parent generation can produce
    /// duplicates.
    pub undirected: bool,
    /// Stop as soon as a goal state is discovered.
    pub stop_on_goal: bool,
}

impl Default for DddOptions {
    fn default() -> Self {
        Self {
            capacity: 1 << 22,
            undirected: false,
            stop_on_goal: true,
        }
    }
}

/// The delayed-duplicate-detection engine.
pub struct DddBfs;

impl DddBfs {
    /// Runs the search from the domain's start state.
    pub fn solve<D: Domain>(domain: &D, opts: &DddOptions) -> Result<SearchOutcome> {
        if opts.capacity < 2 {
            return Err(SolveError::Capacity("DDD buffer cannot hold the start".into()));
        }
        let mut buf = vec![0u64; opts.capacity].into_boxed_slice();
        let mut cfg = domain.start();
        let mut succ: Vec<Successor> = Vec::new();

        let start = domain.encode(&cfg)?;
        buf[0] = start;
        let mut pp_end = 0usize;
        let mut prev_end = 1usize;
        let mut cur_end = 1usize;

        let mut reachable = 1u64;
        let mut generations = vec![1u64];
        let mut depth = 0u32;
        let mut goal: Option<u32> = None;
        if domain.is_goal(&cfg) {
            goal = Some(0);
        }

        'search: while goal.map_or(true, |_| !opts.stop_on_goal) {
            // Expand every state of `prev`, appending children verbatim.
            for i in pp_end..prev_end {
                domain.decode(buf[i], &mut cfg)?;
                succ.clear();
                domain.expand(&mut cfg, &mut succ)?;
                for s in &succ {
                    if s.is_goal && goal.is_none() {
                        goal = Some(depth + 1);
                        if opts.stop_on_goal {
                            break 'search;
                        }
                    }
                    if cur_end == buf.len() {
                        cur_end = repack(&mut buf, pp_end, prev_end, cur_end);
                        if cur_end == buf.len() {
                            return Err(SolveError::Capacity(
                                "DDD buffer full even after repacking".into(),
                            ));
                        }
                    }
                    buf[cur_end] = s.rank;
                    cur_end += 1;
                }
            }

            cur_end = repack(&mut buf, pp_end, prev_end, cur_end);
            let gen_count = (cur_end - prev_end) as u64;
            if gen_count == 0 {
                break;
            }
            reachable += gen_count;
            generations.push(gen_count);
            depth += 1;

            if opts.undirected {
                // Drop the cumulative history; only the parent generation
                // can feed duplicates into the next one.
                let plen = prev_end - pp_end;
                let clen = cur_end - prev_end;
                buf.copy_within(pp_end..prev_end, 0);
                buf.copy_within(prev_end..cur_end, plen);
                pp_end = plen;
                prev_end = plen + clen;
            } else {
                // Fold `prev` into the history; `cur` is already in place
                // as the next `prev`.
                buf[..prev_end].sort_unstable();
                pp_end = prev_end;
                prev_end = cur_end;
            }
            cur_end = prev_end;
        }

        tracing::debug!(
            reachable,
            depth = generations.len() - 1,
            solved = goal.is_some(),
            "delayed-duplicate-detection search finished"
        );
        Ok(SearchOutcome {
            reachable,
            generations,
            goal_depth: goal,
            solution: None,
        })
    }
}

/// Sorts `cur`, removes internal duplicates and everything already present
/// in `prevprev` or `prev`, and returns the compacted end index.
fn repack(buf: &mut [u64], pp_end: usize, prev_end: usize, cur_end: usize) -> usize {
    let (history, tail) = buf.split_at_mut(prev_end);
    let cur = &mut tail[..cur_end - prev_end];
    cur.sort_unstable();

    let prevprev = &history[..pp_end];
    let prev = &history[pp_end..];
    let mut w = 0usize;
    for r in 0..cur.len() {
        let x = cur[r];
        if w > 0 && cur[w - 1] == x {
            continue;
        }
        if prevprev.binary_search(&x).is_ok() || prev.binary_search(&x).is_ok() {
            continue;
        }
        cur[w] = x;
        w += 1;
    }
    prev_end + w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repack_drops_duplicates_and_history() {
        // prevprev = [1, 5], prev = [2, 9], cur = raw children.
        let mut buf = [1, 5, 2, 9, 7, 2, 9, 7, 3, 1];
        let end = repack(&mut buf, 2, 4, 10);
        assert_eq!(end, 6);
        assert_eq!(&buf[4..end], &[3, 7]);
    }

    #[test]
    fn repack_of_empty_cur_is_noop() {
        let mut buf = [4, 8];
        assert_eq!(repack(&mut buf, 1, 2, 2), 2);
    }
}
