//! Sokoban with deadlock detection, popup walls, force floors, and the
//! optional Chip's-Challenge block-slap move.
//!
//! The instance is immutable after [`Sokoban::load`]: grid taxonomy, the
//! two coordinate indexings (all player-traversable floor, and live
//! block-capable floor only), popup and goal-corridor lists, the Pascal
//! table, and the composed state-space dimensions. Everything that moves
//! lives in [`Board`].

mod board;
mod codec;
mod deadlock;
mod moves;

pub use board::Board;

use crate::codec::{PascalTable, RadixBuilder, StateSpace};
use crate::domain::parse::{
    missing_size, parse_pair, parse_size, warn_unknown, InstanceReader,
};
use crate::domain::{Domain, Successor};
use crate::error::{Result, SolveError};

/// A compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// Negative y.
    Up,
    /// Positive y.
    Down,
    /// Negative x.
    Left,
    /// Positive x.
    Right,
}

/// Expansion order; also the facing-digit order in the codec.
pub const DIRS: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

impl Dir {
    #[inline]
    pub(super) fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    /// Codec digit; 4 is reserved for "unset".
    #[inline]
    pub(super) fn digit(self) -> u64 {
        match self {
            Dir::Up => 0,
            Dir::Down => 1,
            Dir::Left => 2,
            Dir::Right => 3,
        }
    }

    #[inline]
    pub(super) fn from_digit(digit: u64) -> Option<Dir> {
        match digit {
            0 => Some(Dir::Up),
            1 => Some(Dir::Down),
            2 => Some(Dir::Left),
            3 => Some(Dir::Right),
            _ => None,
        }
    }

    /// The two directions perpendicular to `self`.
    #[inline]
    pub(super) fn perpendicular(self) -> [Dir; 2] {
        match self {
            Dir::Up | Dir::Down => [Dir::Left, Dir::Right],
            Dir::Left | Dir::Right => [Dir::Up, Dir::Down],
        }
    }
}

/// Static category of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Impassable.
    Wall,
    /// Passable floor; `dead` floor refuses blocks but not the player.
    Floor {
        /// Set by the user (`_`) or by the deadlock preanalysis.
        dead: bool,
    },
    /// Live floor that must end with a block on it.
    Destination,
    /// Traversable until first stepped on, then a permanent wall.
    Popup,
    /// Conveyor that never holds the player or a block between moves.
    Force(Dir),
}

/// An immutable Sokoban instance.
pub struct Sokoban {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    /// Player-traversable floor cells in index order.
    cell_of_floor: Vec<u32>,
    /// Cell → index among live (block-capable) floor, `u16::MAX` = none.
    live_of_cell: Vec<u16>,
    cell_of_live: Vec<u32>,
    /// Cell → popup index, `u16::MAX` = none.
    popup_of_cell: Vec<u16>,
    popup_cells: Vec<u32>,
    destinations: Vec<u32>,
    /// Goal corridors, cells ordered from the closed end outward.
    corridors: Vec<Vec<u32>>,
    goal_cell: Option<usize>,
    nblocks: usize,
    slap: bool,
    check_n_pattern: bool,
    check_corridor: bool,
    table: PascalTable,
    space: StateSpace,
    start: Board,
}

const NO_INDEX: u16 = u16::MAX;

impl Sokoban {
    /// Parses an instance from its text form and runs the one-time
    /// deadlock preanalysis. Malformed input is fatal.
    pub fn load(text: &str) -> Result<Self> {
        let mut reader = InstanceReader::new(text);
        let mut size = None;
        let mut goal_xy = None;
        let mut slap = false;
        let mut check_n_pattern = true;
        let mut check_corridor = true;
        let mut rows = None;

        while let Some(d) = reader.next_directive() {
            match d.keyword {
                "size" => size = Some(parse_size(&d)?),
                "goal" => goal_xy = Some(parse_pair(&d)?),
                "slap" => slap = true,
                "skip-n-deadlock" => check_n_pattern = false,
                "skip-goal-corridor-deadlock" => check_corridor = false,
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

        Self::build(
            width,
            height,
            &rows,
            goal_xy,
            slap,
            check_n_pattern,
            check_corridor,
        )
    }

    #[allow(clippy::too_many_lines)]
    fn build(
        width: usize,
        height: usize,
        rows: &[String],
        goal_xy: Option<(usize, usize)>,
        slap: bool,
        check_n_pattern: bool,
        check_corridor: bool,
    ) -> Result<Self> {
        let ncells = width * height;
        let mut cells = vec![Cell::Wall; ncells];
        let mut blocks = Vec::new();
        let mut player = None;
        let mut goal_cell = None;

        for (y, row) in rows.iter().enumerate() {
            let mut chars = row.chars();
            for x in 0..width {
                let c = y * width + x;
                // Short rows fall back to wall, same as out-of-bounds.
                let ch = chars.next().unwrap_or('#');
                cells[c] = match ch {
                    '#' => Cell::Wall,
                    ' ' => Cell::Floor { dead: false },
                    '.' => Cell::Destination,
                    '$' => {
                        blocks.push(c);
                        Cell::Floor { dead: false }
                    }
                    '*' => {
                        blocks.push(c);
                        Cell::Destination
                    }
                    '@' => {
                        set_player(&mut player, c, y)?;
                        Cell::Floor { dead: false }
                    }
                    '+' => {
                        set_player(&mut player, c, y)?;
                        Cell::Destination
                    }
                    '_' => Cell::Floor { dead: true },
                    '=' => {
                        set_player(&mut player, c, y)?;
                        Cell::Floor { dead: true }
                    }
                    'g' => {
                        goal_cell = Some(c);
                        Cell::Floor { dead: false }
                    }
                    'o' => Cell::Popup,
                    '<' => Cell::Force(Dir::Left),
                    '>' => Cell::Force(Dir::Right),
                    '^' => Cell::Force(Dir::Up),
                    'v' => Cell::Force(Dir::Down),
                    other => {
                        return Err(SolveError::Parse {
                            line: y + 1,
                            msg: format!("unknown map character `{other}`"),
                        })
                    }
                };
            }
        }

        let player = player.ok_or(SolveError::Parse {
            line: 0,
            msg: "map has no player".into(),
        })?;
        if let Some((x, y)) = goal_xy {
            if x >= width || y >= height {
                return Err(SolveError::Parse {
                    line: 0,
                    msg: format!("goal ({x}, {y}) outside the grid"),
                });
            }
            goal_cell = Some(y * width + x);
        }

        // One-time pull analysis: floor no destination can reach by pulls
        // refuses blocks from here on. Force floors let blocks travel in
        // ways pulls cannot model, so their presence disables the pass.
        if !cells.iter().any(|c| matches!(c, Cell::Force(_))) {
            deadlock::mark_dead_floor(width, height, &mut cells);
        }

        // Coordinate indexings. Floor covers every cell the player can
        // ever occupy; live covers block-capable cells only.
        let mut floor_of_cell = vec![NO_INDEX; ncells];
        let mut cell_of_floor = Vec::new();
        let mut live_of_cell = vec![NO_INDEX; ncells];
        let mut cell_of_live = Vec::new();
        let mut popup_of_cell = vec![NO_INDEX; ncells];
        let mut popup_cells = Vec::new();
        let mut destinations = Vec::new();

        for c in 0..ncells {
            match cells[c] {
                Cell::Floor { .. } | Cell::Destination | Cell::Popup => {
                    floor_of_cell[c] = to_u16(cell_of_floor.len())?;
                    cell_of_floor.push(c as u32);
                }
                Cell::Wall | Cell::Force(_) => {}
            }
            match cells[c] {
                Cell::Floor { dead: false } | Cell::Destination => {
                    live_of_cell[c] = to_u16(cell_of_live.len())?;
                    cell_of_live.push(c as u32);
                }
                _ => {}
            }
            if cells[c] == Cell::Popup {
                popup_of_cell[c] = to_u16(popup_cells.len())?;
                popup_cells.push(c as u32);
            }
            if cells[c] == Cell::Destination {
                destinations.push(c as u32);
            }
        }

        let nblocks = blocks.len();
        if nblocks < destinations.len() {
            return Err(SolveError::Parse {
                line: 0,
                msg: format!(
                    "{} blocks cannot fill {} destinations",
                    nblocks,
                    destinations.len()
                ),
            });
        }
        if cell_of_live.len() < nblocks {
            return Err(SolveError::Parse {
                line: 0,
                msg: format!(
                    "live floor ({}) smaller than block count ({nblocks})",
                    cell_of_live.len()
                ),
            });
        }
        for &b in &blocks {
            if live_of_cell[b] == NO_INDEX {
                return Err(SolveError::Parse {
                    line: 0,
                    msg: format!(
                        "block starts on dead floor at ({}, {})",
                        b % width,
                        b / width
                    ),
                });
            }
        }
        if floor_of_cell[player] == NO_INDEX {
            return Err(SolveError::Parse {
                line: 0,
                msg: "player starts outside the floor".into(),
            });
        }

        let corridors = if check_corridor {
            deadlock::find_goal_corridors(width, height, &cells)
        } else {
            Vec::new()
        };

        // Layer radices, outer to inner; each is cross-checked against its
        // floating-point shadow as it is multiplied in.
        let table = PascalTable::new(cell_of_live.len().max(cell_of_floor.len()))?;
        let mut radices = RadixBuilder::new();
        if slap {
            radices.push(5)?;
        }
        radices.push((cell_of_floor.len() - nblocks) as u64)?;
        radices.push(table.checked_binomial(cell_of_live.len(), nblocks)?)?;
        for _ in 0..popup_cells.len() {
            radices.push(2)?;
        }
        let space = radices.finish();

        let mut start = Board::new(ncells, popup_cells.len());
        start.player = player;
        for &b in &blocks {
            start.blocks[b] = true;
            if cells[b] == Cell::Destination {
                start.blocks_on_dest += 1;
            }
        }

        tracing::debug!(
            width,
            height,
            floor = cell_of_floor.len(),
            live = cell_of_live.len(),
            blocks = nblocks,
            popups = popup_cells.len(),
            max_rank = space.max_rank(),
            state_size = space.state_size(),
            "sokoban instance loaded"
        );

        Ok(Self {
            width,
            height,
            cells,
            cell_of_floor,
            live_of_cell,
            cell_of_live,
            popup_of_cell,
            popup_cells,
            destinations,
            corridors,
            goal_cell,
            nblocks,
            slap,
            check_n_pattern,
            check_corridor,
            table,
            space,
            start,
        })
    }

    /// Grid width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Static category of `cell`.
    #[inline]
    pub fn cell(&self, cell: usize) -> Cell {
        self.cells[cell]
    }

    /// The neighbouring cell in direction `d`, or `None` past the border.
    #[inline]
    pub(super) fn step(&self, cell: usize, d: Dir) -> Option<usize> {
        let (dx, dy) = d.delta();
        let x = (cell % self.width) as isize + dx;
        let y = (cell / self.width) as isize + dy;
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Wall test with the border treated as wall; a popped popup counts.
    #[inline]
    pub(super) fn is_wall(&self, board: &Board, cell: Option<usize>) -> bool {
        match cell {
            None => true,
            Some(c) => match self.cells[c] {
                Cell::Wall => true,
                Cell::Popup => board.popped[self.popup_of_cell[c] as usize],
                _ => false,
            },
        }
    }

    /// Whether blocks may come to rest on `cell`.
    #[inline]
    pub(super) fn is_live(&self, cell: usize) -> bool {
        self.live_of_cell[cell] != NO_INDEX
    }

    /// Renders the configuration in the input character set.
    fn render_board(&self, board: &Board) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = y * self.width + x;
                let ch = match self.cells[c] {
                    Cell::Wall => '#',
                    Cell::Destination => {
                        if board.blocks[c] {
                            '*'
                        } else if board.player == c {
                            '+'
                        } else {
                            '.'
                        }
                    }
                    Cell::Popup => {
                        if board.player == c {
                            '@'
                        } else if board.popped[self.popup_of_cell[c] as usize] {
                            '#'
                        } else {
                            'o'
                        }
                    }
                    Cell::Force(Dir::Up) => '^',
                    Cell::Force(Dir::Down) => 'v',
                    Cell::Force(Dir::Left) => '<',
                    Cell::Force(Dir::Right) => '>',
                    Cell::Floor { dead } => {
                        if board.blocks[c] {
                            '$'
                        } else if board.player == c {
                            if dead {
                                '='
                            } else {
                                '@'
                            }
                        } else if Some(c) == self.goal_cell {
                            'g'
                        } else if dead {
                            '_'
                        } else {
                            ' '
                        }
                    }
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

impl Domain for Sokoban {
    type Config = Board;

    fn space(&self) -> StateSpace {
        self.space
    }

    fn start(&self) -> Board {
        self.start.clone()
    }

    fn encode(&self, cfg: &Board) -> Result<u64> {
        self.encode_board(cfg)
    }

    fn decode(&self, rank: u64, cfg: &mut Board) -> Result<()> {
        self.decode_board(rank, cfg)
    }

    fn expand(&self, cfg: &mut Board, out: &mut Vec<Successor>) -> Result<()> {
        self.expand_board(cfg, out)
    }

    fn is_goal(&self, cfg: &Board) -> bool {
        self.won(cfg)
    }

    fn render(&self, cfg: &Board) -> String {
        self.render_board(cfg)
    }
}

fn set_player(slot: &mut Option<usize>, cell: usize, row: usize) -> Result<()> {
    if slot.replace(cell).is_some() {
        return Err(SolveError::Parse {
            line: row + 1,
            msg: "more than one player".into(),
        });
    }
    Ok(())
}

fn to_u16(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| SolveError::TooLarge("cell index exceeds u16".into()))
}
