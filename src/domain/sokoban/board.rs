//! Mutable Sokoban configuration: the grid overlay of movable entities.

use super::Dir;

/// One worker's current configuration.
///
/// The static topology lives in [`super::Sokoban`]; a `Board` holds only
/// what moves: block occupancy, the player cell, the facing direction of
/// the last step (slap variant), and which popup walls have been popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Block occupancy, indexed by cell.
    pub(super) blocks: Vec<bool>,
    /// Player cell index.
    pub(super) player: usize,
    /// Direction of the player's previous step, `None` when unset.
    pub(super) facing: Option<Dir>,
    /// Popped state per popup index.
    pub(super) popped: Vec<bool>,
    /// Blocks currently sitting on destination cells.
    pub(super) blocks_on_dest: usize,
}

impl Board {
    pub(super) fn new(cells: usize, popups: usize) -> Self {
        Self {
            blocks: vec![false; cells],
            player: 0,
            facing: None,
            popped: vec![false; popups],
            blocks_on_dest: 0,
        }
    }

    /// Whether a block occupies `cell`.
    #[inline]
    pub fn has_block(&self, cell: usize) -> bool {
        self.blocks[cell]
    }

    /// The player's cell index.
    #[inline]
    pub fn player(&self) -> usize {
        self.player
    }

    /// Whether `cell` holds neither a block nor the player.
    #[inline]
    pub(super) fn is_clear(&self, cell: usize) -> bool {
        !self.blocks[cell] && self.player != cell
    }
}
