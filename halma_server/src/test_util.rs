// Test doubles for driving a `GameHandler` without sockets or real rules.
//
// - `RecordingClient`: a participant whose responses land in a channel. It can
//   also pose as a bot seat, so the worker plays for it while the test listens.
// - `RaceBoard`: one pawn per seat on its own row. Each pawn may step one
//   hole to the right, or jump straight to its seat's home hole, which
//   finishes the seat.
// - `PresetBoard`: a real `StarBoard` with a hand-made layout, seats handed
//   out in order.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use halma_board::{BoardModel, BoardVariant, MoveError, Pawn, PawnId, PlayerSlot, StarBoard};
use halma_protocol::{ClientId, ClientInfo, Corner, Position, Response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MatchOptions;
use crate::participant::ClientSession;
use crate::roster::Member;

pub struct RecordingClient {
    info: ClientInfo,
    outbox: Sender<Response>,
    bot: bool,
}

impl RecordingClient {
    pub fn new(id: u64, name: &str) -> (Member, Receiver<Response>) {
        Self::build(id, name, false)
    }

    /// A seat the worker plays for, still recording what it is sent.
    pub fn bot(id: u64, name: &str) -> (Member, Receiver<Response>) {
        Self::build(id, name, true)
    }

    fn build(id: u64, name: &str, bot: bool) -> (Member, Receiver<Response>) {
        let (tx, rx) = mpsc::channel();
        let client = Arc::new(Self {
            info: ClientInfo::new(ClientId(id), name),
            outbox: tx,
            bot,
        });
        (client, rx)
    }
}

impl ClientSession for RecordingClient {
    fn id(&self) -> ClientId {
        self.info.connection_id
    }

    fn info(&self) -> ClientInfo {
        self.info.clone()
    }

    fn send(&self, response: Response) {
        let _ = self.outbox.send(response);
    }

    fn is_bot(&self) -> bool {
        self.bot
    }
}

/// Next response, failing the test if none arrives in time.
pub fn next(rx: &Receiver<Response>) -> Response {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("timed out waiting for a response")
}

/// Whatever is already queued.
pub fn drain(rx: &Receiver<Response>) -> Vec<Response> {
    rx.try_iter().collect()
}

/// Seat the match worker picks first for `seed`.
pub fn first_seat(seed: u64, seats: usize) -> usize {
    StdRng::seed_from_u64(seed).random_range(0..seats)
}

pub fn race_options(seed: u64) -> MatchOptions {
    MatchOptions {
        board_factory: Arc::new(|variant: BoardVariant| -> Box<dyn BoardModel> {
            Box::new(RaceBoard::new(variant))
        }),
        rng_seed: Some(seed),
        ..MatchOptions::default()
    }
}

pub struct RaceBoard {
    variant: BoardVariant,
    pawns: Vec<Pawn>,
    placings: Vec<usize>,
}

impl RaceBoard {
    pub fn new(variant: BoardVariant) -> Self {
        Self {
            variant,
            pawns: Vec::new(),
            placings: Vec::new(),
        }
    }

    pub fn start(seat: usize) -> Position {
        Position::new(0, seat as i32)
    }

    pub fn home(seat: usize) -> Position {
        Position::new(-1, seat as i32)
    }

    fn seat_pawn(&self, seat: usize, at: Position) -> Option<&Pawn> {
        self.pawns.get(seat).filter(|p| p.position == at)
    }
}

impl BoardModel for RaceBoard {
    fn add_player(&mut self) -> Option<PlayerSlot> {
        let seat = self.pawns.len();
        let corner = *self.variant.goal_corners().get(seat)?;
        let id = PawnId(seat as u32);
        self.pawns.push(Pawn::new(id, seat, Self::start(seat)));
        Some(PlayerSlot {
            seat,
            corner,
            pawns: vec![id],
        })
    }

    fn pawn(&self, id: PawnId) -> Option<&Pawn> {
        self.pawns.get(id.0 as usize)
    }

    fn corner(&self, seat: usize) -> Option<Corner> {
        self.variant.goal_corners().get(seat).copied()
    }

    fn legal_destinations(&self, seat: usize, from: Position) -> Vec<Position> {
        match self.seat_pawn(seat, from) {
            Some(pawn) if !pawn.in_target => vec![from.offset(1, 0), Self::home(seat)],
            _ => Vec::new(),
        }
    }

    fn apply_move(&mut self, seat: usize, from: Position, to: Position) -> Result<(), MoveError> {
        if seat >= self.pawns.len() {
            return Err(MoveError::UnknownSeat(seat));
        }
        if !self.legal_destinations(seat, from).contains(&to) {
            return Err(MoveError::IllegalDestination { from, to });
        }
        let pawn = &mut self.pawns[seat];
        pawn.position = to;
        pawn.in_move = true;
        pawn.in_target = to == Self::home(seat);
        if pawn.in_target {
            self.placings.push(seat);
        }
        Ok(())
    }

    fn end_turn(&mut self, seat: usize) {
        if let Some(pawn) = self.pawns.get_mut(seat) {
            pawn.reset_turn_state();
        }
    }

    fn player_has_finished(&self, seat: usize) -> bool {
        self.pawns.get(seat).is_some_and(|p| p.in_target)
    }

    fn match_in_progress(&self) -> bool {
        let unfinished = self.pawns.iter().filter(|p| !p.in_target).count();
        match self.pawns.len() {
            0 => false,
            1 => unfinished == 1,
            _ => unfinished >= 2,
        }
    }

    fn placings(&self) -> Vec<usize> {
        self.placings.clone()
    }
}

/// Star-board rules on a layout of the test's choosing.
pub fn preset_options(seed: u64, layouts: Vec<Vec<Position>>) -> MatchOptions {
    MatchOptions {
        board_factory: Arc::new(move |variant: BoardVariant| -> Box<dyn BoardModel> {
            Box::new(PresetBoard::new(StarBoard::with_layout(variant, &layouts)))
        }),
        rng_seed: Some(seed),
        ..MatchOptions::default()
    }
}

pub struct PresetBoard {
    board: StarBoard,
    seated: usize,
}

impl PresetBoard {
    pub fn new(board: StarBoard) -> Self {
        Self { board, seated: 0 }
    }
}

impl BoardModel for PresetBoard {
    fn add_player(&mut self) -> Option<PlayerSlot> {
        let seat = self.seated;
        let corner = self.board.corner(seat)?;
        self.seated += 1;
        Some(PlayerSlot {
            seat,
            corner,
            pawns: self.board.pawns_of(seat).map(|p| p.id).collect(),
        })
    }

    fn pawn(&self, id: PawnId) -> Option<&Pawn> {
        self.board.pawn(id)
    }

    fn corner(&self, seat: usize) -> Option<Corner> {
        self.board.corner(seat)
    }

    fn legal_destinations(&self, seat: usize, from: Position) -> Vec<Position> {
        self.board.legal_destinations(seat, from)
    }

    fn apply_move(&mut self, seat: usize, from: Position, to: Position) -> Result<(), MoveError> {
        self.board.apply_move(seat, from, to)
    }

    fn end_turn(&mut self, seat: usize) {
        self.board.end_turn(seat);
    }

    fn player_has_finished(&self, seat: usize) -> bool {
        self.board.player_has_finished(seat)
    }

    fn match_in_progress(&self) -> bool {
        self.board.match_in_progress()
    }

    fn placings(&self) -> Vec<usize> {
        self.board.placings()
    }
}
