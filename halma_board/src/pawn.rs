// Pawns and their per-turn movement state.
//
// Pawns live in the board's arena and are referred to by `PawnId` everywhere
// else (the server's `Player` keeps a list of IDs, never the pawns
// themselves). Identity and ownership are fixed at placement; only the
// position, the target flag and the per-turn flags change.

use halma_protocol::Position;
use serde::{Deserialize, Serialize};

/// Index into the board's pawn arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PawnId(pub u32);

#[derive(Clone, Debug)]
pub struct Pawn {
    pub id: PawnId,
    /// Seat index of the owning player.
    pub owner: usize,
    pub position: Position,
    /// Whether the pawn currently stands in its owner's goal arm.
    pub in_target: bool,
    /// Moved at least once during the current turn.
    pub in_move: bool,
    /// The current turn's movement was a single step, which ends it.
    pub after_step: bool,
}

impl Pawn {
    pub fn new(id: PawnId, owner: usize, position: Position) -> Self {
        Self {
            id,
            owner,
            position,
            in_target: false,
            in_move: false,
            after_step: false,
        }
    }

    /// Clear the per-turn flags.
    pub fn reset_turn_state(&mut self) {
        self.in_move = false;
        self.after_step = false;
    }
}
