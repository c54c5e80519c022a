//! Deadlock preanalysis and per-successor pruning patterns.
//!
//! Preanalysis runs once at load: an undirected BFS of *pull* moves from
//! every destination marks the floor a block can actually leave from; the
//! rest becomes dead floor. The pattern checks (2×2, N-pattern, goal
//! corridor) run on every candidate successor, localized to the windows
//! containing the block that just moved.

use super::{Board, Cell, Dir, Sokoban, DIRS};

/// Marks as dead every floor cell no destination can reach by pulls.
///
/// A block is pulled from `c` to `c + d` when both `c + d` and `c + 2d`
/// are inside the grid, not walls, and not user-dead; the landing cell
/// must additionally be able to hold a block (no popups, no force floors).
pub(super) fn mark_dead_floor(width: usize, height: usize, cells: &mut [Cell]) {
    let ncells = width * height;
    let mut live = vec![false; ncells];
    let mut queue = Vec::new();

    for c in 0..ncells {
        if cells[c] == Cell::Destination {
            live[c] = true;
            queue.push(c);
        }
    }

    let step = |c: usize, d: Dir| -> Option<usize> {
        let (dx, dy) = d.delta();
        let x = (c % width) as isize + dx;
        let y = (c / width) as isize + dy;
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            return None;
        }
        Some(y as usize * width + x as usize)
    };

    while let Some(c) = queue.pop() {
        for d in DIRS {
            let Some(to) = step(c, d) else { continue };
            let Some(beyond) = step(to, d) else { continue };
            if live[to] || !pull_through(cells[to]) || !pull_through(cells[beyond]) {
                continue;
            }
            if !matches!(cells[to], Cell::Floor { dead: false } | Cell::Destination) {
                continue;
            }
            live[to] = true;
            queue.push(to);
        }
    }

    for c in 0..ncells {
        if cells[c] == (Cell::Floor { dead: false }) && !live[c] {
            cells[c] = Cell::Floor { dead: true };
        }
    }
}

/// Whether a pull move may pass through this cell category.
fn pull_through(cell: Cell) -> bool {
    match cell {
        Cell::Wall | Cell::Force(_) => false,
        Cell::Floor { dead } => !dead,
        Cell::Destination | Cell::Popup => true,
    }
}

/// Finds dead-end corridors of ≥ 3 consecutive destinations walled along
/// both flanks, open at exactly one end. Cells are ordered from the closed
/// end outward.
pub(super) fn find_goal_corridors(width: usize, height: usize, cells: &[Cell]) -> Vec<Vec<u32>> {
    let mut corridors = Vec::new();
    let wall_at = |x: isize, y: isize| -> bool {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            return true;
        }
        cells[y as usize * width + x as usize] == Cell::Wall
    };

    // Horizontal runs.
    for y in 0..height {
        let mut x = 0;
        while x < width {
            let start = x;
            while x < width
                && cells[y * width + x] == Cell::Destination
                && wall_at(x as isize, y as isize - 1)
                && wall_at(x as isize, y as isize + 1)
            {
                x += 1;
            }
            let len = x - start;
            if len >= 3 {
                let closed_left = wall_at(start as isize - 1, y as isize);
                let closed_right = wall_at(x as isize, y as isize);
                if closed_left != closed_right {
                    let mut run: Vec<u32> =
                        (start..x).map(|cx| (y * width + cx) as u32).collect();
                    if closed_right {
                        run.reverse();
                    }
                    corridors.push(run);
                }
            }
            x = x.max(start + 1);
        }
    }

    // Vertical runs.
    for x in 0..width {
        let mut y = 0;
        while y < height {
            let start = y;
            while y < height
                && cells[y * width + x] == Cell::Destination
                && wall_at(x as isize - 1, y as isize)
                && wall_at(x as isize + 1, y as isize)
            {
                y += 1;
            }
            let len = y - start;
            if len >= 3 {
                let closed_top = wall_at(x as isize, start as isize - 1);
                let closed_bottom = wall_at(x as isize, y as isize);
                if closed_top != closed_bottom {
                    let mut run: Vec<u32> =
                        (start..y).map(|cy| (cy * width + x) as u32).collect();
                    if closed_bottom {
                        run.reverse();
                    }
                    corridors.push(run);
                }
            }
            y = y.max(start + 1);
        }
    }

    corridors
}

impl Sokoban {
    /// Whether placing a block at `moved` (already applied to `board`)
    /// produces a provably unwinnable configuration.
    pub(super) fn is_deadlocked(&self, board: &Board, moved: usize) -> bool {
        if self.two_by_two_deadlock(board, moved) {
            return true;
        }
        if self.check_n_pattern && self.n_pattern_deadlock(board, moved) {
            return true;
        }
        self.check_corridor && self.corridor_deadlock(board)
    }

    /// 2×2 window of walls and blocks with at least one block off its
    /// destination. Only the four windows containing `moved` can have
    /// changed.
    fn two_by_two_deadlock(&self, board: &Board, moved: usize) -> bool {
        let x0 = (moved % self.width) as isize;
        let y0 = (moved / self.width) as isize;
        for wy in [y0 - 1, y0] {
            for wx in [x0 - 1, x0] {
                let mut off_dest = false;
                let mut solid = true;
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    match self.cell_at(wx + dx, wy + dy) {
                        None => {}
                        Some(c) if self.cells[c] == Cell::Wall => {}
                        Some(c)
                            if self.cells[c] == Cell::Popup
                                && board.popped[self.popup_of_cell[c] as usize] => {}
                        Some(c) if board.blocks[c] => {
                            if self.cells[c] != Cell::Destination {
                                off_dest = true;
                            }
                        }
                        Some(_) => {
                            solid = false;
                            break;
                        }
                    }
                }
                if solid && off_dest {
                    return true;
                }
            }
        }
        false
    }

    /// Two adjacent blocks, each unable to move along the shared axis's
    /// perpendicular because a wall flanks it. Four rotations arise from
    /// the two axes and the two partner sides.
    fn n_pattern_deadlock(&self, board: &Board, moved: usize) -> bool {
        for d in DIRS {
            let Some(partner) = self.step(moved, d) else {
                continue;
            };
            if !board.blocks[partner] {
                continue;
            }
            let [p1, p2] = d.perpendicular();
            let pinned = |c: usize| {
                self.is_wall(board, self.step(c, p1)) || self.is_wall(board, self.step(c, p2))
            };
            if pinned(moved) && pinned(partner) {
                let off_dest = self.cells[moved] != Cell::Destination
                    || self.cells[partner] != Cell::Destination;
                if off_dest {
                    return true;
                }
            }
        }
        false
    }

    /// A corridor reading "empty, block, empty" means a block was pushed
    /// halfway in and abandoned; no later push can ever reach behind it.
    pub(super) fn corridor_deadlock(&self, board: &Board) -> bool {
        for corridor in &self.corridors {
            for w in corridor.windows(3) {
                let (a, b, c) = (w[0] as usize, w[1] as usize, w[2] as usize);
                if board.is_clear(a) && board.blocks[b] && board.is_clear(c) {
                    return true;
                }
            }
        }
        false
    }

    #[inline]
    fn cell_at(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    const SQUARE: &str = "\
size 6 6
map
######
#    #
# $$ #
# $$ #
#@...#
######
";

    const SQUARE_DONE: &str = "\
size 6 6
map
######
#    #
# ** #
# ** #
#@   #
######
";

    fn cell(w: usize, x: usize, y: usize) -> usize {
        y * w + x
    }

    #[test]
    fn four_block_square_off_destination_is_dead() {
        let dom = Sokoban::load(SQUARE).unwrap();
        let board = dom.start();
        assert!(dom.is_deadlocked(&board, cell(6, 2, 2)));
    }

    #[test]
    fn four_block_square_on_destinations_is_alive() {
        let dom = Sokoban::load(SQUARE_DONE).unwrap();
        let board = dom.start();
        assert!(!dom.is_deadlocked(&board, cell(6, 2, 2)));
    }

    const Z_PATTERN: &str = "\
size 8 7
map
########
#  #   #
# $ $  #
# #   .#
#    @.#
#      #
########
";

    #[test]
    fn z_pattern_pair_is_dead_once_pinned() {
        let dom = Sokoban::load(Z_PATTERN).unwrap();
        let mut board = dom.start();
        // Push the right block west so the pair sits wall-pinned.
        board.blocks[cell(8, 4, 2)] = false;
        board.blocks[cell(8, 3, 2)] = true;
        assert!(dom.is_deadlocked(&board, cell(8, 3, 2)));
    }

    #[test]
    fn skip_directive_disables_the_z_pattern_check() {
        let text = format!("skip-n-deadlock\n{Z_PATTERN}");
        let dom = Sokoban::load(&text).unwrap();
        let mut board = dom.start();
        board.blocks[cell(8, 4, 2)] = false;
        board.blocks[cell(8, 3, 2)] = true;
        assert!(!dom.is_deadlocked(&board, cell(8, 3, 2)));
    }

    const CORRIDOR: &str = "\
size 8 7
map
########
#      #
# $ ####
# $ ...#
# $ ####
#@     #
########
";

    #[test]
    fn abandoned_corridor_block_is_dead() {
        let dom = Sokoban::load(CORRIDOR).unwrap();
        let mut board = dom.start();
        board.blocks[cell(8, 2, 3)] = false;
        board.blocks[cell(8, 5, 3)] = true;
        assert!(dom.corridor_deadlock(&board));
    }

    #[test]
    fn corridor_block_with_the_player_behind_is_alive() {
        let dom = Sokoban::load(CORRIDOR).unwrap();
        let mut board = dom.start();
        board.blocks[cell(8, 2, 3)] = false;
        board.blocks[cell(8, 5, 3)] = true;
        board.player = cell(8, 4, 3);
        assert!(!dom.corridor_deadlock(&board));
    }

    #[test]
    fn corridors_open_at_both_ends_are_not_collected() {
        let (w, h) = (8usize, 3usize);
        let mut cells = vec![Cell::Wall; w * h];
        for x in 1..7 {
            cells[w + x] = Cell::Floor { dead: false };
        }
        for x in 2..5 {
            cells[w + x] = Cell::Destination;
        }
        // Walled flanks but floor at both ends: not a dead end.
        assert!(find_goal_corridors(w, h, &cells).is_empty());

        // Closing the left end makes it a corridor, ordered closed→open.
        cells[w + 1] = Cell::Wall;
        let corridors = find_goal_corridors(w, h, &cells);
        assert_eq!(corridors, vec![vec![(w + 2) as u32, (w + 3) as u32, (w + 4) as u32]]);
    }

    #[test]
    fn pull_analysis_marks_unreachable_floor_dead() {
        // The nook behind the destination can never push a block out.
        let dom = Sokoban::load(CORRIDOR).unwrap();
        assert!(matches!(
            dom.cell(cell(8, 1, 1)),
            Cell::Floor { dead: true }
        ));
        assert!(dom.is_live(cell(8, 2, 2)));
        assert!(!dom.is_live(cell(8, 1, 2)));
    }
}
