//! The n-puzzle: sliding tiles on a W×H board, encoded as a single
//! factorial rank over all tile values.
//!
//! Half of the n! permutations are unreachable (parity), which the codec
//! tolerates as holes. Boards beyond 20 tiles would overflow the 64-bit
//! rank and are rejected at load.

use crate::codec::factorial::MAX_PERMUTATION;
use crate::codec::{factorial, rank_permutation, unrank_permutation, StateSpace};
use crate::domain::parse::{missing_size, parse_size, warn_unknown, InstanceReader};
use crate::domain::{Domain, Successor};
use crate::error::{Result, SolveError};

/// An immutable n-puzzle instance.
pub struct NPuzzle {
    width: usize,
    height: usize,
    space: StateSpace,
    start: Tiles,
    goal: Vec<u8>,
}

/// One worker's tile arrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tiles {
    cells: Vec<u8>,
    blank: usize,
}

impl NPuzzle {
    /// Parses an instance. The goal is always the identity arrangement:
    /// tiles ascending row-major with the blank last.
    pub fn load(text: &str) -> Result<Self> {
        let mut reader = InstanceReader::new(text);
        let mut size = None;
        let mut rows = None;

        while let Some(d) = reader.next_directive() {
            match d.keyword {
                "size" => size = Some(parse_size(&d)?),
                "map" => {
                    let (_, h) = size.ok_or_else(|| missing_size(&d))?;
                    // Rows may be wider than W characters because of
                    // {NNN} literals; take them raw.
                    rows = Some(
                        reader
                            .take_map_rows(usize::MAX, h)
                            .map(|r| r.into_iter().map(String::from).collect::<Vec<_>>())?,
                    );
                    break;
                }
                _ => warn_unknown(&d),
            }
        }

        let (width, height) = size.ok_or(SolveError::Parse {
            line: reader.line_no(),
            msg: "missing `size` directive".into(),
        })?;
        let rows = rows.ok_or(SolveError::Parse {
            line: reader.line_no(),
            msg: "missing `map` directive".into(),
        })?;

        let n = width * height;
        if n > MAX_PERMUTATION {
            return Err(SolveError::TooLarge(format!(
                "{n} tiles exceed the {MAX_PERMUTATION}-tile factorial rank"
            )));
        }

        let mut cells = Vec::with_capacity(n);
        for (y, row) in rows.iter().enumerate() {
            let tiles = parse_tile_row(row, y + 1)?;
            if tiles.len() != width {
                return Err(SolveError::Parse {
                    line: y + 1,
                    msg: format!("expected {width} tiles, found {}", tiles.len()),
                });
            }
            cells.extend(tiles);
        }

        let mut seen = vec![false; n];
        for &t in &cells {
            let t = t as usize;
            if t >= n || seen[t] {
                return Err(SolveError::Parse {
                    line: 0,
                    msg: format!("tiles are not a permutation of 0..{n}"),
                });
            }
            seen[t] = true;
        }
        let blank = cells.iter().position(|&t| t == 0).expect("0 is present");

        // Identity goal: 1, 2, …, n−1, blank.
        let mut goal: Vec<u8> = (1..n as u8).collect();
        goal.push(0);

        let space = StateSpace::from_max_rank(factorial(n) - 1);

        tracing::debug!(
            width,
            height,
            max_rank = space.max_rank(),
            "n-puzzle instance loaded"
        );
        Ok(Self {
            width,
            height,
            space,
            start: Tiles { cells, blank },
            goal,
        })
    }
}

fn parse_tile_row(row: &str, line: usize) -> Result<Vec<u8>> {
    let mut tiles = Vec::new();
    let mut chars = row.chars();
    while let Some(ch) = chars.next() {
        let value = match ch {
            ' ' | '0' => 0u64,
            '1'..='9' => ch as u64 - '0' as u64,
            'A'..='Z' => ch as u64 - 'A' as u64 + 10,
            'a'..='z' => ch as u64 - 'a' as u64 + 36,
            '{' => {
                let digits: String = chars.by_ref().take_while(|&c| c != '}').collect();
                digits.parse().map_err(|_| SolveError::Parse {
                    line,
                    msg: format!("bad tile literal {{{digits}}}"),
                })?
            }
            other => {
                return Err(SolveError::Parse {
                    line,
                    msg: format!("unknown tile character `{other}`"),
                })
            }
        };
        tiles.push(u8::try_from(value).map_err(|_| SolveError::Parse {
            line,
            msg: format!("tile {value} out of range"),
        })?);
    }
    Ok(tiles)
}

impl Domain for NPuzzle {
    type Config = Tiles;

    fn space(&self) -> StateSpace {
        self.space
    }

    fn start(&self) -> Tiles {
        self.start.clone()
    }

    fn encode(&self, cfg: &Tiles) -> Result<u64> {
        Ok(rank_permutation(&cfg.cells))
    }

    fn decode(&self, rank: u64, cfg: &mut Tiles) -> Result<()> {
        if rank > self.space.max_rank() {
            return Err(SolveError::Invariant(format!(
                "rank {rank} exceeds the state space"
            )));
        }
        unrank_permutation(rank, &mut cfg.cells);
        cfg.blank = cfg.cells.iter().position(|&t| t == 0).ok_or_else(|| {
            SolveError::Invariant("decoded board has no blank".into())
        })?;
        Ok(())
    }

    fn expand(&self, cfg: &mut Tiles, out: &mut Vec<Successor>) -> Result<()> {
        let (bx, by) = (cfg.blank % self.width, cfg.blank / self.width);
        for (dx, dy) in [(0isize, -1isize), (0, 1), (-1, 0), (1, 0)] {
            let (x, y) = (bx as isize + dx, by as isize + dy);
            if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
                continue;
            }
            let from = y as usize * self.width + x as usize;
            let blank = cfg.blank;
            cfg.cells.swap(blank, from);
            cfg.blank = from;
            out.push(Successor {
                rank: rank_permutation(&cfg.cells),
                is_goal: cfg.cells == self.goal,
            });
            cfg.blank = blank;
            cfg.cells.swap(blank, from);
        }
        Ok(())
    }

    fn is_goal(&self, cfg: &Tiles) -> bool {
        cfg.cells == self.goal
    }

    fn render(&self, cfg: &Tiles) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let t = cfg.cells[y * self.width + x];
                match t {
                    0 => out.push(' '),
                    1..=9 => out.push((b'0' + t) as char),
                    10..=35 => out.push((b'A' + t - 10) as char),
                    36..=61 => out.push((b'a' + t - 36) as char),
                    _ => out.push_str(&format!("{{{t}}}")),
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BY_TWO: &str = "size 2 2\nmap\n31\n20\n";

    #[test]
    fn loads_and_roundtrips() {
        let dom = NPuzzle::load(TWO_BY_TWO).unwrap();
        assert_eq!(dom.space().count(), Some(24));
        let mut t = dom.start();
        for rank in 0..=dom.space().max_rank() {
            dom.decode(rank, &mut t).unwrap();
            assert_eq!(dom.encode(&t).unwrap(), rank);
        }
    }

    #[test]
    fn start_is_parsed_row_major() {
        let dom = NPuzzle::load(TWO_BY_TWO).unwrap();
        assert_eq!(dom.start.cells, vec![3, 1, 2, 0]);
        assert_eq!(dom.start.blank, 3);
    }

    #[test]
    fn rejects_non_permutations() {
        assert!(NPuzzle::load("size 2 2\nmap\n11\n20\n").is_err());
    }

    #[test]
    fn rejects_oversized_boards() {
        let rows: String = (0..21).map(|_| "1\n").collect();
        let text = format!("size 1 21\nmap\n{rows}");
        assert!(NPuzzle::load(&text).is_err());
    }
}
