//! Plank puzzles: carry planks between stumps until the target stump is
//! reached.
//!
//! The input grid is 2×-expanded: stumps sit at even coordinates, bridge
//! characters (`-`, `|`) fill the expanded cells between them. A plank of
//! length ℓ bridges two aligned stumps exactly ℓ logical steps apart with
//! no stump strictly between. The codec gives every plank length one
//! binary layer over its bridge slots plus one inventory position, and the
//! player one position layer over the stumps.

use crate::codec::{rank_ones, PascalTable, RadixBuilder, StateSpace, UnrankOnes};
use crate::domain::parse::{missing_size, parse_size, warn_unknown, InstanceReader};
use crate::domain::{Domain, Successor};
use crate::error::{Result, SolveError};

const NO_STUMP: u16 = u16::MAX;

/// A bridge slot: two aligned stumps a plank can span.
struct Slot {
    a: u16,
    b: u16,
    len_idx: u8,
    /// Expanded cells the plank covers; used for crossing conflicts.
    cells: Vec<u32>,
}

/// An immutable plank-puzzle instance.
pub struct Plank {
    width: usize,
    height: usize,
    stump_cells: Vec<u32>,
    slots: Vec<Slot>,
    /// Per length index: slot ids in layer-position order.
    by_length: Vec<Vec<u16>>,
    /// Planks of each length in the instance.
    counts: Vec<u8>,
    /// Per slot: other slots sharing an expanded cell (crossing bans).
    conflicts: Vec<Vec<u16>>,
    /// Per stump: slots with an end there.
    touching: Vec<Vec<u16>>,
    target: u16,
    table: PascalTable,
    space: StateSpace,
    start: Planks,
}

/// One worker's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planks {
    installed: Vec<bool>,
    /// Length index of the held plank, if any.
    held: Option<u8>,
    player: u16,
}

impl Plank {
    /// Parses an instance from its 2×-expanded text form.
    pub fn load(text: &str) -> Result<Self> {
        let mut reader = InstanceReader::new(text);
        let mut size = None;
        let mut rows = None;

        while let Some(d) = reader.next_directive() {
            match d.keyword {
                "size" => size = Some(parse_size(&d)?),
                "map" => {
                    let (w, h) = size.ok_or_else(|| missing_size(&d))?;
                    rows = Some(
                        reader
                            .take_map_rows(w, h)?
                            .into_iter()
                            .map(String::from)
                            .collect::<Vec<_>>(),
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

        Self::build(width, height, &rows)
    }

    #[allow(clippy::too_many_lines)]
    fn build(width: usize, height: usize, rows: &[String]) -> Result<Self> {
        let ncells = width * height;
        let mut grid = vec![' '; ncells];
        let mut stump_cells = Vec::new();
        let mut stump_of_cell = vec![NO_STUMP; ncells];
        let mut start_stump = None;
        let mut target_stump = None;

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let c = y * width + x;
                grid[c] = ch;
                match ch {
                    '*' | 'S' | 'T' => {
                        if x % 2 != 0 || y % 2 != 0 {
                            return Err(SolveError::Parse {
                                line: y + 1,
                                msg: format!("stump off the even grid at ({x}, {y})"),
                            });
                        }
                        let id = u16::try_from(stump_cells.len()).map_err(|_| {
                            SolveError::TooLarge("stump count exceeds u16".into())
                        })?;
                        stump_of_cell[c] = id;
                        stump_cells.push(c as u32);
                        if ch == 'S' {
                            start_stump = Some(id);
                        }
                        if ch == 'T' {
                            target_stump = Some(id);
                        }
                    }
                    ' ' | '-' | '|' => {}
                    other => {
                        return Err(SolveError::Parse {
                            line: y + 1,
                            msg: format!("unknown map character `{other}`"),
                        })
                    }
                }
            }
        }

        let start_stump = start_stump.ok_or(SolveError::Parse {
            line: 0,
            msg: "no start stump `S`".into(),
        })?;
        let target = target_stump.ok_or(SolveError::Parse {
            line: 0,
            msg: "no target stump `T`".into(),
        })?;

        // Enumerate slots: aligned stump pairs with no stump strictly
        // between, in scan order so layer positions are deterministic.
        let mut slots = Vec::new();
        for (a, &ac) in stump_cells.iter().enumerate() {
            let (ax, ay) = ((ac as usize) % width, (ac as usize) / width);
            for (horizontal, (dx, dy)) in [(true, (2usize, 0usize)), (false, (0, 2))] {
                let (mut x, mut y) = (ax, ay);
                let mut cells = Vec::new();
                loop {
                    // Advance one logical step, collecting covered cells.
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= width || ny >= height {
                        break;
                    }
                    cells.push(((y + ny) / 2 * width + (x + nx) / 2) as u32);
                    let c = ny * width + nx;
                    x = nx;
                    y = ny;
                    if stump_of_cell[c] != NO_STUMP {
                        let len = if horizontal { (x - ax) / 2 } else { (y - ay) / 2 };
                        slots.push((a as u16, stump_of_cell[c], len as u16, cells));
                        break;
                    }
                    cells.push(c as u32);
                }
            }
        }

        // Length indexing, ascending by logical length.
        let mut lengths: Vec<u16> = slots.iter().map(|s| s.2).collect();
        lengths.sort_unstable();
        lengths.dedup();
        let len_index = |len: u16| lengths.iter().position(|&l| l == len).expect("known") as u8;

        let slots: Vec<Slot> = slots
            .into_iter()
            .map(|(a, b, len, cells)| Slot {
                a,
                b,
                len_idx: len_index(len),
                cells,
            })
            .collect();

        let mut by_length: Vec<Vec<u16>> = vec![Vec::new(); lengths.len()];
        for (i, s) in slots.iter().enumerate() {
            by_length[s.len_idx as usize].push(i as u16);
        }

        // Installed planks: slots whose covered cells all carry the right
        // bridge character.
        let mut installed = vec![false; slots.len()];
        let mut covered = vec![false; ncells];
        for (i, s) in slots.iter().enumerate() {
            let want = if stump_cells[s.a as usize] as usize / width
                == stump_cells[s.b as usize] as usize / width
            {
                '-'
            } else {
                '|'
            };
            if s.cells.iter().all(|&c| grid[c as usize] == want) {
                installed[i] = true;
                for &c in &s.cells {
                    covered[c as usize] = true;
                }
            }
        }
        for c in 0..ncells {
            if (grid[c] == '-' || grid[c] == '|') && !covered[c] {
                return Err(SolveError::Parse {
                    line: c / width + 1,
                    msg: format!("bridge at ({}, {}) spans no slot", c % width, c / width),
                });
            }
        }

        let mut counts = vec![0u8; lengths.len()];
        for (i, s) in slots.iter().enumerate() {
            if installed[i] {
                counts[s.len_idx as usize] += 1;
            }
        }

        // Crossing conflicts between slots sharing an expanded cell.
        let mut conflicts: Vec<Vec<u16>> = vec![Vec::new(); slots.len()];
        for i in 0..slots.len() {
            for j in 0..slots.len() {
                if i != j && slots[i].cells.iter().any(|c| slots[j].cells.contains(c)) {
                    conflicts[i].push(j as u16);
                }
            }
        }

        let mut touching: Vec<Vec<u16>> = vec![Vec::new(); stump_cells.len()];
        for (i, s) in slots.iter().enumerate() {
            touching[s.a as usize].push(i as u16);
            touching[s.b as usize].push(i as u16);
        }

        let max_slots = by_length.iter().map(Vec::len).max().unwrap_or(0);
        let table = PascalTable::new(max_slots + 1)?;
        let mut radices = RadixBuilder::new();
        radices.push(stump_cells.len() as u64)?;
        for (li, ids) in by_length.iter().enumerate() {
            radices.push(table.checked_binomial(ids.len() + 1, counts[li] as usize)?)?;
        }
        let space = radices.finish();

        tracing::debug!(
            stumps = stump_cells.len(),
            slots = slots.len(),
            lengths = lengths.len(),
            max_rank = space.max_rank(),
            "plank instance loaded"
        );

        Ok(Self {
            width,
            height,
            stump_cells,
            slots,
            by_length,
            counts,
            conflicts,
            touching,
            target,
            table,
            space,
            start: Planks {
                installed,
                held: None,
                player: start_stump,
            },
        })
    }

    /// Stumps reachable from the player across installed planks.
    fn reachable(&self, state: &Planks) -> Vec<u16> {
        let mut seen = vec![false; self.stump_cells.len()];
        let mut queue = std::collections::VecDeque::from([state.player]);
        seen[state.player as usize] = true;
        let mut order = Vec::new();
        while let Some(s) = queue.pop_front() {
            order.push(s);
            for &slot in &self.touching[s as usize] {
                if !state.installed[slot as usize] {
                    continue;
                }
                let sl = &self.slots[slot as usize];
                let other = if sl.a == s { sl.b } else { sl.a };
                if !seen[other as usize] {
                    seen[other as usize] = true;
                    queue.push_back(other);
                }
            }
        }
        order
    }

    /// Whether the slot's span is clear of every crossing plank.
    fn slot_free(&self, state: &Planks, slot: u16) -> bool {
        !state.installed[slot as usize]
            && self.conflicts[slot as usize]
                .iter()
                .all(|&other| !state.installed[other as usize])
    }

    fn emit(&self, state: &Planks, out: &mut Vec<Successor>) -> Result<()> {
        let rank = self.encode_state(state)?;
        out.push(Successor {
            rank,
            is_goal: state.player == self.target,
        });
        Ok(())
    }

    fn encode_state(&self, state: &Planks) -> Result<u64> {
        let mut value = state.player as u64;
        for (li, ids) in self.by_length.iter().enumerate() {
            let n = ids.len() + 1;
            let k = self.counts[li] as usize;
            let ones = ids
                .iter()
                .enumerate()
                .filter(|&(_, &slot)| state.installed[slot as usize])
                .map(|(pos, _)| pos)
                .chain((state.held == Some(li as u8)).then_some(ids.len()));
            value = value * self.table.binomial(n, k) + rank_ones(&self.table, n, k, ones);
        }
        if value > self.space.max_rank() {
            return Err(SolveError::Invariant(format!(
                "encoded rank {value} exceeds the state space"
            )));
        }
        Ok(value)
    }

    fn decode_state(&self, rank: u64, state: &mut Planks) -> Result<()> {
        if rank > self.space.max_rank() {
            return Err(SolveError::Invariant(format!(
                "rank {rank} exceeds the state space"
            )));
        }
        let mut value = rank;
        state.installed.fill(false);
        state.held = None;
        for li in (0..self.by_length.len()).rev() {
            let ids = &self.by_length[li];
            let n = ids.len() + 1;
            let k = self.counts[li] as usize;
            let radix = self.table.binomial(n, k);
            let layer = value % radix;
            value /= radix;
            for pos in UnrankOnes::new(&self.table, n, k, layer) {
                if pos == ids.len() {
                    state.held = Some(li as u8);
                } else {
                    state.installed[ids[pos] as usize] = true;
                }
            }
        }
        state.player = u16::try_from(value).map_err(|_| {
            SolveError::Invariant("player layer exceeds the stump count".into())
        })?;
        if (state.player as usize) >= self.stump_cells.len() {
            return Err(SolveError::Invariant(
                "player index exceeds the stump count".into(),
            ));
        }
        Ok(())
    }
}

impl Domain for Plank {
    type Config = Planks;

    fn space(&self) -> StateSpace {
        self.space
    }

    fn start(&self) -> Planks {
        self.start.clone()
    }

    fn encode(&self, cfg: &Planks) -> Result<u64> {
        self.encode_state(cfg)
    }

    fn decode(&self, rank: u64, cfg: &mut Planks) -> Result<()> {
        self.decode_state(rank, cfg)
    }

    fn expand(&self, cfg: &mut Planks, out: &mut Vec<Successor>) -> Result<()> {
        let origin = cfg.player;
        for s in self.reachable(cfg) {
            // Plain movement: one state per reachable stump.
            if s != origin {
                cfg.player = s;
                self.emit(cfg, out)?;
            }
            cfg.player = s;
            if let Some(held) = cfg.held {
                // Drop the held plank into any fitting free slot here.
                for &slot in &self.touching[s as usize] {
                    let sl = &self.slots[slot as usize];
                    if sl.len_idx != held || !self.slot_free(cfg, slot) {
                        continue;
                    }
                    cfg.installed[slot as usize] = true;
                    cfg.held = None;
                    self.emit(cfg, out)?;
                    cfg.held = Some(held);
                    cfg.installed[slot as usize] = false;
                }
            } else {
                // Pick up any installed plank with an end here.
                for &slot in &self.touching[s as usize] {
                    if !cfg.installed[slot as usize] {
                        continue;
                    }
                    let len_idx = self.slots[slot as usize].len_idx;
                    cfg.installed[slot as usize] = false;
                    cfg.held = Some(len_idx);
                    self.emit(cfg, out)?;
                    cfg.held = None;
                    cfg.installed[slot as usize] = true;
                }
            }
        }
        cfg.player = origin;
        Ok(())
    }

    fn is_goal(&self, cfg: &Planks) -> bool {
        cfg.player == self.target
    }

    fn render(&self, cfg: &Planks) -> String {
        let mut grid = vec![' '; self.width * self.height];
        for (id, &c) in self.stump_cells.iter().enumerate() {
            grid[c as usize] = if id as u16 == cfg.player {
                'S'
            } else if id as u16 == self.target {
                'T'
            } else {
                '*'
            };
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if !cfg.installed[i] {
                continue;
            }
            let horizontal = self.stump_cells[slot.a as usize] as usize / self.width
                == self.stump_cells[slot.b as usize] as usize / self.width;
            for &c in &slot.cells {
                grid[c as usize] = if horizontal { '-' } else { '|' };
            }
        }
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(grid[y * self.width + x]);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S and T one logical step apart, plank installed between them.
    const CROSSED: &str = "size 3 1\nmap\nS-T\n";
    // Plank starts on the far side; the player must walk it over.
    const CARRY: &str = "size 5 1\nmap\nS-*,T\n";

    #[test]
    fn loads_installed_bridge() {
        let dom = Plank::load(CROSSED).unwrap();
        assert_eq!(dom.slots.len(), 1);
        assert_eq!(dom.counts, vec![1]);
        assert!(dom.start.installed[0]);
    }

    #[test]
    fn full_range_roundtrips() {
        let dom = Plank::load(CROSSED).unwrap();
        let mut state = dom.start();
        for rank in 0..=dom.space().max_rank() {
            dom.decode(rank, &mut state).unwrap();
            assert_eq!(dom.encode(&state).unwrap(), rank);
        }
    }

    #[test]
    fn crossing_is_one_move() {
        let dom = Plank::load(CROSSED).unwrap();
        let mut out = Vec::new();
        let mut state = dom.start();
        dom.expand(&mut state, &mut out).unwrap();
        assert!(out.iter().any(|s| s.is_goal));
    }

    #[test]
    fn rejects_bad_characters() {
        assert!(Plank::load(CARRY).is_err());
    }
}
