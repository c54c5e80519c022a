//! Rank composition for Sokoban boards.
//!
//! Layer order, outer to inner: facing direction (slap variant only),
//! player position among empty floor, block placement over live floor,
//! one bit per popup wall. Decoding fixes the blocks first and then
//! indexes the player over the remaining empty floor, so whether the
//! player stands on live or dead floor never needs a case split.

use super::{Board, Cell, Dir, Sokoban};
use crate::codec::{rank_ones, UnrankOnes};
use crate::error::{Result, SolveError};

/// Facing digit meaning "no slap-relevant previous step".
const FACING_UNSET: u64 = 4;

impl Sokoban {
    pub(super) fn won(&self, board: &Board) -> bool {
        board.blocks_on_dest == self.destinations.len()
            && self.goal_cell.map_or(true, |g| board.player == g)
    }

    /// Facing digit after normalization: a direction survives encoding only
    /// while it still enables a slap, merging every quiescent state into
    /// the "unset" class.
    fn facing_digit(&self, board: &Board) -> u64 {
        match board.facing {
            Some(f) if self.slap_enables(board, f) => f.digit(),
            _ => FACING_UNSET,
        }
    }

    fn slap_enables(&self, board: &Board, facing: Dir) -> bool {
        facing
            .perpendicular()
            .into_iter()
            .any(|p| self.slap_cells(board, p).is_some())
    }

    pub(super) fn encode_board(&self, board: &Board) -> Result<u64> {
        let mut value = 0u64;
        if self.slap {
            value = self.facing_digit(board);
        }

        let player_radix = (self.cell_of_floor.len() - self.nblocks) as u64;
        let mut player_index = None;
        let mut empties = 0u64;
        for &fc in &self.cell_of_floor {
            let c = fc as usize;
            if board.blocks[c] {
                continue;
            }
            if c == board.player {
                player_index = Some(empties);
                break;
            }
            empties += 1;
        }
        let player_index = player_index.ok_or_else(|| {
            SolveError::Invariant("player is not on an empty floor cell".into())
        })?;
        value = value * player_radix + player_index;

        let nlive = self.cell_of_live.len();
        let block_radix = self.table.binomial(nlive, self.nblocks);
        let block_rank = rank_ones(
            &self.table,
            nlive,
            self.nblocks,
            self.cell_of_live
                .iter()
                .enumerate()
                .filter(|&(_, &c)| board.blocks[c as usize])
                .map(|(i, _)| i),
        );
        value = value * block_radix + block_rank;

        for &popped in &board.popped {
            value = value * 2 + u64::from(popped);
        }

        if value > self.space.max_rank() {
            return Err(SolveError::Invariant(format!(
                "encoded rank {value} exceeds the state space"
            )));
        }
        Ok(value)
    }

    pub(super) fn decode_board(&self, rank: u64, board: &mut Board) -> Result<()> {
        if rank > self.space.max_rank() {
            return Err(SolveError::Invariant(format!(
                "rank {rank} exceeds the state space"
            )));
        }
        let mut value = rank;

        for i in (0..board.popped.len()).rev() {
            board.popped[i] = value & 1 == 1;
            value >>= 1;
        }

        let nlive = self.cell_of_live.len();
        let block_radix = self.table.binomial(nlive, self.nblocks);
        let block_rank = value % block_radix;
        value /= block_radix;
        board.blocks.fill(false);
        board.blocks_on_dest = 0;
        for i in UnrankOnes::new(&self.table, nlive, self.nblocks, block_rank) {
            let c = self.cell_of_live[i] as usize;
            board.blocks[c] = true;
            if self.cells[c] == Cell::Destination {
                board.blocks_on_dest += 1;
            }
        }

        let player_radix = (self.cell_of_floor.len() - self.nblocks) as u64;
        let player_index = value % player_radix;
        value /= player_radix;
        let mut empties = 0u64;
        let mut player = None;
        for &fc in &self.cell_of_floor {
            let c = fc as usize;
            if board.blocks[c] {
                continue;
            }
            if empties == player_index {
                player = Some(c);
                break;
            }
            empties += 1;
        }
        board.player = player.ok_or_else(|| {
            SolveError::Invariant("player index exceeds the empty floor".into())
        })?;

        board.facing = if self.slap {
            debug_assert!(value <= FACING_UNSET);
            Dir::from_digit(value)
        } else {
            debug_assert_eq!(value, 0);
            None
        };
        Ok(())
    }
}
