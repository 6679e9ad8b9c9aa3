// Per-seat match state owned by the match worker.
//
// A `Player` never owns pawns; it holds `PawnId` handles into the board and
// asks the board for their state. Created at match start with its goal corner,
// pawns attached right after the board seats it.

use halma_board::{BoardModel, PawnId};
use halma_protocol::{ClientId, Corner};

/// Whether the current turn's first move has been made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveType {
    First,
    Next,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub client_id: ClientId,
    pub corner: Corner,
    pub pawns: Vec<PawnId>,
    pub move_type: MoveType,
}

impl Player {
    pub fn new(client_id: ClientId, corner: Corner) -> Self {
        Self {
            client_id,
            corner,
            pawns: Vec::new(),
            move_type: MoveType::First,
        }
    }

    pub fn attach_pawns(&mut self, pawns: Vec<PawnId>) {
        debug_assert!(self.pawns.is_empty(), "pawns attached twice");
        self.pawns = pawns;
    }

    /// Every pawn stands in the goal arm.
    pub fn has_finished(&self, board: &dyn BoardModel) -> bool {
        self.pawns
            .iter()
            .all(|id| board.pawn(*id).is_some_and(|p| p.in_target))
    }

    pub fn end_turn(&mut self) {
        self.move_type = MoveType::First;
    }
}
