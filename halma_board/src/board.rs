// The star board: pawn placement, move legality and move application.
//
// `StarBoard` is the stock `BoardModel`. Rules:
// - A turn's movement belongs to one pawn. It is either a single step into an
//   adjacent empty hole, or a chain of jumps, each over an adjacent pawn (any
//   owner) into the empty hole directly behind it.
// - A step ends the pawn's movement for the turn; after a jump the same pawn
//   may keep jumping, but never into a hole it already occupied during the
//   current chain.
// - A pawn standing in its goal arm may not leave it.
//
// Per-turn state (which pawn moved, whether it stepped, the holes of the
// current chain) is cleared by `end_turn`.
//
// See also: `geometry.rs` for the star shape, `variant.rs` for which goal
// corners each seat gets, and `halma_server::game_handler` for the turn loop
// that drives this through the `BoardModel` trait.

use std::collections::BTreeMap;

use halma_protocol::{Corner, Position};

use crate::error::MoveError;
use crate::geometry::{self, HOLES_PER_ARM, NEIGHBOR_OFFSETS};
use crate::pawn::{Pawn, PawnId};
use crate::variant::BoardVariant;
use crate::{BoardModel, PlayerSlot};

#[derive(Clone, Debug)]
pub struct StarBoard {
    variant: BoardVariant,
    pawns: Vec<Pawn>,
    occupancy: BTreeMap<Position, PawnId>,
    seats: Vec<SeatPawns>,
    /// Holes visited by the moving pawn this turn, starting hole first.
    chain: Vec<Position>,
    /// Seats in the order they finished.
    placings: Vec<usize>,
}

#[derive(Clone, Debug)]
struct SeatPawns {
    corner: Corner,
    pawns: Vec<PawnId>,
}

impl StarBoard {
    pub fn new(variant: BoardVariant) -> Self {
        Self {
            variant,
            pawns: Vec::new(),
            occupancy: BTreeMap::new(),
            seats: Vec::new(),
            chain: Vec::new(),
            placings: Vec::new(),
        }
    }

    /// Build a board with every seat's pawns at explicit positions instead of
    /// their starting arm. Seats take the variant's goal corners in order;
    /// extra layouts beyond the variant's player count are ignored.
    ///
    /// Intended for puzzles and tests.
    pub fn with_layout(variant: BoardVariant, layouts: &[Vec<Position>]) -> Self {
        let mut board = Self::new(variant);
        for (corner, positions) in variant.goal_corners().iter().zip(layouts) {
            board.seat_player(*corner, positions);
        }
        board
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn pawn_at(&self, position: Position) -> Option<&Pawn> {
        let id = self.occupancy.get(&position)?;
        self.pawns.get(id.0 as usize)
    }

    pub fn pawns_of(&self, seat: usize) -> impl Iterator<Item = &Pawn> {
        self.seats
            .get(seat)
            .into_iter()
            .flat_map(|s| s.pawns.iter())
            .filter_map(|id| self.pawns.get(id.0 as usize))
    }

    fn seat_player(&mut self, corner: Corner, positions: &[Position]) -> PlayerSlot {
        let seat = self.seats.len();
        let mut ids = Vec::with_capacity(positions.len());
        for &position in positions {
            let id = PawnId(self.pawns.len() as u32);
            let mut pawn = Pawn::new(id, seat, position);
            pawn.in_target = geometry::arm_of(position) == Some(corner);
            self.pawns.push(pawn);
            self.occupancy.insert(position, id);
            ids.push(id);
        }
        self.seats.push(SeatPawns {
            corner,
            pawns: ids.clone(),
        });
        PlayerSlot {
            seat,
            corner,
            pawns: ids,
        }
    }

    fn is_free(&self, position: Position) -> bool {
        geometry::is_on_board(position) && !self.occupancy.contains_key(&position)
    }

    fn moving_pawn(&self, seat: usize) -> Option<&Pawn> {
        self.pawns_of(seat).find(|p| p.in_move)
    }
}

impl BoardModel for StarBoard {
    fn add_player(&mut self) -> Option<PlayerSlot> {
        let corner = *self.variant.goal_corners().get(self.seats.len())?;
        let start = geometry::arm(corner.opposite());
        debug_assert_eq!(start.len(), HOLES_PER_ARM);
        Some(self.seat_player(corner, &start))
    }

    fn pawn(&self, id: PawnId) -> Option<&Pawn> {
        self.pawns.get(id.0 as usize)
    }

    fn corner(&self, seat: usize) -> Option<Corner> {
        self.seats.get(seat).map(|s| s.corner)
    }

    fn legal_destinations(&self, seat: usize, from: Position) -> Vec<Position> {
        let Some(seat_pawns) = self.seats.get(seat) else {
            return Vec::new();
        };
        let Some(pawn) = self.pawn_at(from) else {
            return Vec::new();
        };
        if pawn.owner != seat {
            return Vec::new();
        }
        if let Some(moving) = self.moving_pawn(seat) {
            if moving.id != pawn.id || moving.after_step {
                return Vec::new();
            }
        }

        let mut destinations = Vec::new();
        if !pawn.in_move {
            destinations.extend(geometry::neighbors(from).filter(|n| self.is_free(*n)));
        }
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let over = from.offset(dx, dy);
            let land = from.offset(2 * dx, 2 * dy);
            if self.occupancy.contains_key(&over)
                && self.is_free(land)
                && !self.chain.contains(&land)
            {
                destinations.push(land);
            }
        }
        if pawn.in_target {
            destinations.retain(|p| geometry::arm_of(*p) == Some(seat_pawns.corner));
        }
        destinations
    }

    fn apply_move(&mut self, seat: usize, from: Position, to: Position) -> Result<(), MoveError> {
        let corner = self.corner(seat).ok_or(MoveError::UnknownSeat(seat))?;
        let pawn = self.pawn_at(from).ok_or(MoveError::NoPawnAt(from))?;
        if pawn.owner != seat {
            return Err(MoveError::NotOwnPawn {
                position: from,
                owner: pawn.owner,
            });
        }
        let id = pawn.id;
        if !self.legal_destinations(seat, from).contains(&to) {
            return Err(MoveError::IllegalDestination { from, to });
        }

        let was_finished = self.player_has_finished(seat);
        let jumped = from.chebyshev_distance(to) == 2;
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        if self.chain.is_empty() {
            self.chain.push(from);
        }
        self.chain.push(to);

        let pawn = &mut self.pawns[id.0 as usize];
        pawn.position = to;
        pawn.in_move = true;
        pawn.after_step = !jumped;
        pawn.in_target = geometry::arm_of(to) == Some(corner);

        if !was_finished && self.player_has_finished(seat) {
            self.placings.push(seat);
        }
        Ok(())
    }

    fn end_turn(&mut self, seat: usize) {
        if let Some(seat_pawns) = self.seats.get(seat) {
            for id in &seat_pawns.pawns {
                self.pawns[id.0 as usize].reset_turn_state();
            }
        }
        self.chain.clear();
    }

    fn player_has_finished(&self, seat: usize) -> bool {
        self.seats.get(seat).is_some_and(|s| {
            s.pawns
                .iter()
                .all(|id| self.pawns[id.0 as usize].in_target)
        })
    }

    fn match_in_progress(&self) -> bool {
        let unfinished = (0..self.seats.len())
            .filter(|seat| !self.player_has_finished(*seat))
            .count();
        match self.seats.len() {
            0 => false,
            1 => unfinished == 1,
            _ => unfinished >= 2,
        }
    }

    fn placings(&self) -> Vec<usize> {
        self.placings.clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn two_player_board() -> StarBoard {
        let mut board = StarBoard::new(BoardVariant::TwoPlayers);
        board.add_player().unwrap();
        board.add_player().unwrap();
        board
    }

    #[test]
    fn players_start_opposite_their_goal() {
        let board = two_player_board();
        assert!(board.pawns_of(0).all(|p| geometry::arm_of(p.position) == Some(Corner(3))));
        assert!(board.pawns_of(1).all(|p| geometry::arm_of(p.position) == Some(Corner(0))));
        assert_eq!(board.pawns_of(0).count(), 10);
        assert!(board.match_in_progress());
    }

    #[test]
    fn seats_beyond_the_variant_are_refused() {
        let mut board = two_player_board();
        assert!(board.add_player().is_none());
        assert_eq!(board.seat_count(), 2);
    }

    #[test]
    fn front_pawn_can_step_into_the_centre() {
        let board = two_player_board();
        assert_eq!(
            board.legal_destinations(0, Position::new(13, 9)),
            vec![Position::new(12, 9), Position::new(12, 8)]
        );
    }

    #[test]
    fn other_seats_pawns_have_no_moves() {
        let board = two_player_board();
        assert!(board.legal_destinations(1, Position::new(13, 9)).is_empty());
        assert!(board.legal_destinations(7, Position::new(13, 9)).is_empty());
        assert!(board.legal_destinations(0, Position::new(8, 8)).is_empty());
    }

    #[test]
    fn back_pawn_jumps_over_the_front_row() {
        let board = two_player_board();
        assert_eq!(
            board.legal_destinations(0, Position::new(14, 10)),
            vec![Position::new(12, 10), Position::new(12, 8)]
        );
    }

    #[test]
    fn step_ends_the_pawns_movement() {
        let mut board = two_player_board();
        board
            .apply_move(0, Position::new(13, 9), Position::new(12, 9))
            .unwrap();
        assert!(board.legal_destinations(0, Position::new(12, 9)).is_empty());
        // No other pawn may move in the same turn either.
        assert!(board.legal_destinations(0, Position::new(14, 10)).is_empty());

        board.end_turn(0);
        assert!(!board.legal_destinations(0, Position::new(14, 10)).is_empty());
    }

    #[test]
    fn jump_chain_never_returns_to_a_visited_hole() {
        let mut board = two_player_board();
        board
            .apply_move(0, Position::new(14, 10), Position::new(12, 10))
            .unwrap();
        let next = board.legal_destinations(0, Position::new(12, 10));
        assert!(!next.contains(&Position::new(14, 10)));
        // No pawn left adjacent to jump over except the way back.
        assert!(next.is_empty());
    }

    #[test]
    fn illegal_moves_are_rejected_without_effect() {
        let mut board = two_player_board();
        let err = board
            .apply_move(0, Position::new(13, 9), Position::new(8, 8))
            .unwrap_err();
        assert_eq!(
            err,
            MoveError::IllegalDestination {
                from: Position::new(13, 9),
                to: Position::new(8, 8),
            }
        );
        assert_eq!(
            board.apply_move(0, Position::new(8, 8), Position::new(8, 7)),
            Err(MoveError::NoPawnAt(Position::new(8, 8)))
        );
        assert_eq!(
            board.apply_move(1, Position::new(13, 9), Position::new(12, 9)),
            Err(MoveError::NotOwnPawn {
                position: Position::new(13, 9),
                owner: 0,
            })
        );
        assert!(board.pawn_at(Position::new(13, 9)).is_some());
    }

    #[test]
    fn last_pawn_home_finishes_the_player_and_the_match() {
        let mut board = StarBoard::with_layout(
            BoardVariant::TwoPlayers,
            &[vec![Position::new(4, 4)], vec![Position::new(8, 8)]],
        );
        assert!(board.match_in_progress());

        board
            .apply_move(0, Position::new(4, 4), Position::new(3, 4))
            .unwrap();
        assert!(board.player_has_finished(0));
        assert!(!board.player_has_finished(1));
        assert_eq!(board.placings(), vec![0]);
        assert!(!board.match_in_progress());
    }

    #[test]
    fn pawn_in_its_goal_stays_there() {
        let board = StarBoard::with_layout(
            BoardVariant::TwoPlayers,
            &[
                vec![Position::new(3, 4), Position::new(8, 8)],
                vec![Position::new(10, 10)],
            ],
        );
        let destinations = board.legal_destinations(0, Position::new(3, 4));
        assert!(!destinations.is_empty());
        assert!(
            destinations
                .iter()
                .all(|p| geometry::arm_of(*p) == Some(Corner(0)))
        );
    }
}
