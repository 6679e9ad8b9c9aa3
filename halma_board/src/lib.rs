// halma_board: rules and geometry of the Sternhalma star board.
//
// The server never reaches into board internals; it talks to a
// `BoardModel` trait object, so matches can run on the stock `StarBoard` or
// on a scripted board in tests.
//
// Module overview:
// - `geometry.rs`: the 121-hole star, its six arms and adjacency.
// - `pawn.rs`:     `Pawn` / `PawnId` and the per-turn movement flags.
// - `variant.rs`:  `BoardVariant`, goal corners per seat for each player count.
// - `board.rs`:    `StarBoard`, move generation and application.
// - `error.rs`:    `MoveError`.
//
// See also: `halma_server::game_handler` which drives a `BoardModel` through
// a match.

pub mod board;
pub mod error;
pub mod geometry;
pub mod pawn;
pub mod variant;

use halma_protocol::{Corner, Position};

pub use board::StarBoard;
pub use error::MoveError;
pub use pawn::{Pawn, PawnId};
pub use variant::BoardVariant;

/// A seat handed out by `BoardModel::add_player`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSlot {
    pub seat: usize,
    /// Goal corner; the pawns start on the opposite arm.
    pub corner: Corner,
    pub pawns: Vec<PawnId>,
}

/// Board rules as seen by a match. Seats are the indices returned by
/// `add_player`, in the order players were added.
pub trait BoardModel: Send {
    /// Seat the next player and place their pawns. `None` once every seat of
    /// the variant is taken.
    fn add_player(&mut self) -> Option<PlayerSlot>;

    fn pawn(&self, id: PawnId) -> Option<&Pawn>;

    /// Goal corner of a seat.
    fn corner(&self, seat: usize) -> Option<Corner>;

    /// Holes the pawn at `from` may move to right now. Empty when there is no
    /// pawn there, it belongs to another seat, or this turn's movement rules
    /// rule it out.
    fn legal_destinations(&self, seat: usize, from: Position) -> Vec<Position>;

    fn apply_move(&mut self, seat: usize, from: Position, to: Position) -> Result<(), MoveError>;

    /// Clear the seat's per-turn movement state.
    fn end_turn(&mut self, seat: usize);

    /// Every pawn of the seat stands in its goal arm.
    fn player_has_finished(&self, seat: usize) -> bool;

    /// At least two seats still playing (one, for a single-seat board).
    fn match_in_progress(&self) -> bool;

    /// Seats in finishing order.
    fn placings(&self) -> Vec<usize>;
}
