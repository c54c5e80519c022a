//! Successor generation: walks, pushes, force-floor chains, popup
//! conversion, and the optional block-slap.
//!
//! Moves are applied to the worker's board, encoded, and undone before the
//! next candidate, so the configuration is restored on exit.

use super::{Board, Cell, Dir, Sokoban, DIRS};
use crate::domain::Successor;
use crate::error::Result;

impl Sokoban {
    pub(super) fn expand_board(
        &self,
        board: &mut Board,
        out: &mut Vec<Successor>,
    ) -> Result<()> {
        for d in DIRS {
            self.try_walk_or_push(board, d, out)?;
        }
        if self.slap {
            if let Some(facing) = board.facing {
                for p in facing.perpendicular() {
                    self.try_slap(board, p, out)?;
                }
            }
        }
        Ok(())
    }

    fn try_walk_or_push(
        &self,
        board: &mut Board,
        d: Dir,
        out: &mut Vec<Successor>,
    ) -> Result<()> {
        let Some(target) = self.step(board.player, d) else {
            return Ok(());
        };
        if self.is_wall(board, Some(target)) {
            return Ok(());
        }
        if board.blocks[target] {
            return self.try_push(board, target, d, out);
        }

        // Walk; a force floor carries the player to the chain exit.
        let (landing, last_dir) = if matches!(self.cells[target], Cell::Force(_)) {
            match self.follow_force(board, target, d) {
                Some(exit) => exit,
                None => return Ok(()),
            }
        } else {
            (target, d)
        };
        if board.blocks[landing] {
            return Ok(());
        }

        let saved_player = board.player;
        let saved_facing = board.facing;
        let popup = self.popup_index(landing);
        board.player = landing;
        board.facing = Some(last_dir);
        if let Some(p) = popup {
            board.popped[p] = true;
        }
        // Walking away can strand a half-pushed corridor block.
        if !(self.check_corridor && self.corridor_deadlock(board)) {
            self.emit(board, out)?;
        }
        if let Some(p) = popup {
            board.popped[p] = false;
        }
        board.player = saved_player;
        board.facing = saved_facing;
        Ok(())
    }

    fn try_push(
        &self,
        board: &mut Board,
        block: usize,
        d: Dir,
        out: &mut Vec<Successor>,
    ) -> Result<()> {
        let Some(beyond) = self.step(block, d) else {
            return Ok(());
        };
        if self.is_wall(board, Some(beyond)) {
            return Ok(());
        }
        // A pushed block rides force floors to the chain exit.
        let landing = if matches!(self.cells[beyond], Cell::Force(_)) {
            match self.follow_force(board, beyond, d) {
                Some((exit, _)) => exit,
                None => return Ok(()),
            }
        } else {
            beyond
        };
        if !self.is_live(landing) || board.blocks[landing] {
            return Ok(());
        }

        let saved_player = board.player;
        let saved_facing = board.facing;
        self.move_block(board, block, landing);
        board.player = block;
        board.facing = Some(d);
        if !self.is_deadlocked(board, landing) {
            self.emit(board, out)?;
        }
        self.move_block(board, landing, block);
        board.player = saved_player;
        board.facing = saved_facing;
        Ok(())
    }

    /// Displaces a block perpendicular to the facing direction without the
    /// player stepping.
    fn try_slap(&self, board: &mut Board, p: Dir, out: &mut Vec<Successor>) -> Result<()> {
        let Some((from, to)) = self.slap_cells(board, p) else {
            return Ok(());
        };
        self.move_block(board, from, to);
        if !self.is_deadlocked(board, to) {
            self.emit(board, out)?;
        }
        self.move_block(board, to, from);
        Ok(())
    }

    /// The (block, landing) cells of a legal slap toward `p`, if any.
    pub(super) fn slap_cells(&self, board: &Board, p: Dir) -> Option<(usize, usize)> {
        let from = self.step(board.player, p)?;
        if !board.blocks[from] {
            return None;
        }
        let to = self.step(from, p)?;
        if self.is_wall(board, Some(to)) || !self.is_live(to) || board.blocks[to] {
            return None;
        }
        Some((from, to))
    }

    /// Follows a force-floor chain entered with motion `entry`. Returns the
    /// exit cell and the final travel direction, or `None` when the chain
    /// hits a wall, leaves the grid, or fails to terminate.
    fn follow_force(&self, board: &Board, mut cell: usize, entry: Dir) -> Option<(usize, Dir)> {
        let mut last = entry;
        let mut steps = 0;
        while let Cell::Force(fd) = self.cells[cell] {
            steps += 1;
            if steps > self.width * self.height {
                return None;
            }
            last = fd;
            cell = self.step(cell, fd)?;
            if self.is_wall(board, Some(cell)) {
                return None;
            }
        }
        Some((cell, last))
    }

    fn move_block(&self, board: &mut Board, from: usize, to: usize) {
        board.blocks[from] = false;
        if self.cells[from] == Cell::Destination {
            board.blocks_on_dest -= 1;
        }
        board.blocks[to] = true;
        if self.cells[to] == Cell::Destination {
            board.blocks_on_dest += 1;
        }
    }

    fn emit(&self, board: &Board, out: &mut Vec<Successor>) -> Result<()> {
        let rank = self.encode_board(board)?;
        out.push(Successor {
            rank,
            is_goal: self.won(board),
        });
        Ok(())
    }

    #[inline]
    fn popup_index(&self, cell: usize) -> Option<usize> {
        if self.cells[cell] == Cell::Popup {
            Some(self.popup_of_cell[cell] as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    const SLAP: &str = "size 6 4\nslap\nmap\n######\n# $ .#\n#@   #\n######\n";

    fn cell(x: usize, y: usize) -> usize {
        y * 6 + x
    }

    fn decode_succ(dom: &Sokoban, rank: u64) -> Board {
        let mut b = dom.start();
        dom.decode_board(rank, &mut b).unwrap();
        b
    }

    #[test]
    fn facing_survives_encoding_while_a_slap_is_available() {
        let dom = Sokoban::load(SLAP).unwrap();
        let mut board = dom.start();
        let mut out = Vec::new();
        dom.expand_board(&mut board, &mut out).unwrap();

        // Walking up beside the block keeps the facing alive: the block
        // to the player's right can still be slapped east.
        let beside = out
            .iter()
            .map(|s| decode_succ(&dom, s.rank))
            .find(|b| b.player == cell(1, 1))
            .expect("walk-up successor");
        assert_eq!(beside.facing, Some(Dir::Up));
    }

    #[test]
    fn slap_displaces_the_block_without_moving_the_player() {
        let dom = Sokoban::load(SLAP).unwrap();
        let mut board = dom.start();
        board.player = cell(1, 1);
        board.facing = Some(Dir::Up);

        let mut out = Vec::new();
        dom.expand_board(&mut board, &mut out).unwrap();
        let slapped = out
            .iter()
            .map(|s| decode_succ(&dom, s.rank))
            .find(|b| b.has_block(cell(3, 1)) && b.player == cell(1, 1))
            .expect("slap successor");
        assert!(!slapped.has_block(cell(2, 1)));
    }

    #[test]
    fn facing_normalizes_to_unset_when_no_slap_fits() {
        let dom = Sokoban::load(SLAP).unwrap();

        // At (2, 2) facing east, both perpendicular displacements hit
        // walls; the facing must collapse into the unset class.
        let mut with_facing = dom.start();
        with_facing.player = cell(2, 2);
        with_facing.facing = Some(Dir::Right);
        let mut without = dom.start();
        without.player = cell(2, 2);
        without.facing = None;

        assert_eq!(
            dom.encode_board(&with_facing).unwrap(),
            dom.encode_board(&without).unwrap()
        );
    }

    #[test]
    fn force_chain_loops_abort_the_move() {
        // Two conveyors pointing at each other never terminate.
        let text = "size 6 3\nmap\n######\n#@>< #\n######\n";
        let dom = Sokoban::load(text).unwrap();
        let mut board = dom.start();
        let mut out = Vec::new();
        dom.expand_board(&mut board, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
