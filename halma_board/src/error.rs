use halma_protocol::Position;
use thiserror::Error;

/// Why the board refused a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("no player in seat {0}")]
    UnknownSeat(usize),
    #[error("no pawn at {0}")]
    NoPawnAt(Position),
    #[error("pawn at {position} belongs to seat {owner}")]
    NotOwnPawn { position: Position, owner: usize },
    #[error("{from} -> {to} is not a legal move")]
    IllegalDestination { from: Position, to: Position },
}
