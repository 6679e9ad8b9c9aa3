// The game session orchestrator: one match, from lobby to final placings.
//
// A `GameHandler` is shared (`Arc`) between the connection threads of its
// participants, the `SessionRegistry`, and, once the match starts, its own
// worker thread. The split mirrors a single-writer event loop:
//
// - Connection threads call `add_client` / `remove_client` / `submit`. These
//   touch only the lifecycle state (`GameInfo` behind a mutex), the
//   copy-on-write broadcast `Roster`, and the inbound queue.
// - The match worker (`MatchWorker`, one named thread per match) exclusively
//   owns the board, the `Player`s, the turn index and the RNG. Its only
//   blocking point is `recv` on the inbound queue.
//
// Inbound traffic is a FIFO of `MatchInput`s. Gameplay requests are tagged
// with the submitting client; the worker drops any that do not come from the
// current turn owner. Ending a turn is itself a request travelling through the
// queue, so it is ordered with the moves before it. Cancellation is an `Abort`
// on the same queue.
//
// Turn loop states: `Idle(i)` picks the next playable seat at or after `i`
// (skipping finished and vacated seats) and announces it; `AwaitingTurnEnd(i)`
// dispatches the owner's requests until an `EndTurn`; `Ended` leaves the
// loop. The first `Idle` index is drawn uniformly from the seat count.
//
// Terminal conditions:
// - Natural end (board reports fewer than two unfinished seats): the worker
//   deregisters and broadcasts `GameEnded` with the finishing order.
// - An unfinished player leaves mid-match: `remove_client` deregisters,
//   broadcasts `GameEnded` with no placings and aborts the worker.
// - A finished player leaves: the seat is vacated and play goes on. If only
//   bots would be left, the worker stops and ends the match like a natural
//   end, placings included.
// `finish` runs under the `GameInfo` lock and only once, so exactly one
// `GameEnded` goes out whichever way the match ends.
//
// See also: `roster.rs` (broadcast list, seat table), `registry.rs`,
// `halma_board::BoardModel` for the rules the worker delegates to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use halma_board::{BoardModel, BoardVariant};
use halma_protocol::{
    ClientId, ClientInfo, GameInfo, GameState, GameType, GameplayRequest, Position, Response,
    SessionId,
};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bot::{BotStrategy, goal_distance};
use crate::config::MatchOptions;
use crate::error::SessionError;
use crate::participant::{BotClient, ClientSession};
use crate::player::{MoveType, Player};
use crate::registry::SessionRegistry;
use crate::roster::{Member, Roster, SeatTable};

/// Inbound queue entry.
#[derive(Debug)]
pub enum MatchInput {
    Gameplay {
        from: ClientId,
        request: GameplayRequest,
    },
    /// A finished player left; their seat is out of the rotation.
    Vacated { seat: usize },
    /// The last human left after finishing; end with the placings so far.
    Deserted,
    Abort,
}

pub struct GameHandler {
    id: SessionId,
    info: Mutex<GameInfo>,
    roster: Roster,
    seats: OnceLock<Arc<SeatTable>>,
    queue: Sender<MatchInput>,
    inbox: Mutex<Option<Receiver<MatchInput>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    ended: AtomicBool,
    registry: Arc<SessionRegistry>,
    options: MatchOptions,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GameHandler {
    pub fn new(
        game_type: GameType,
        registry: Arc<SessionRegistry>,
        options: MatchOptions,
    ) -> Arc<Self> {
        let id = registry.next_id();
        let name = format!("{} {id}", options.session_name);
        let (queue, inbox) = mpsc::channel();
        info!("session {id} created ({game_type:?})");
        Arc::new(Self {
            id,
            info: Mutex::new(GameInfo::new(id, name, game_type)),
            roster: Roster::default(),
            seats: OnceLock::new(),
            queue,
            inbox: Mutex::new(Some(inbox)),
            worker: Mutex::new(None),
            ended: AtomicBool::new(false),
            registry,
            options,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game_info(&self) -> GameInfo {
        lock(&self.info).clone()
    }

    pub fn state(&self) -> GameState {
        lock(&self.info).state
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Add a participant. The join that fills the last seat starts the match.
    pub fn add_client(self: &Arc<Self>, client: Member) -> Result<(), SessionError> {
        let mut info = lock(&self.info);
        match info.state {
            GameState::WaitingForPlayers => {}
            GameState::Started => return Err(SessionError::AlreadyStarted),
            GameState::Ended => return Err(SessionError::Ended),
        }
        if self.roster.contains(client.id()) {
            return Err(SessionError::AlreadyJoined);
        }
        let expected = info.game_type.expected_players();
        if info.roster.len() >= expected {
            return Err(SessionError::SessionFull);
        }

        self.roster.broadcast(&Response::SomeoneJoined {
            player: client.info(),
        });
        self.roster.push(Arc::clone(&client));
        info.add_client_info(client.info());
        info!(
            "session {}: {} joined ({}/{expected})",
            self.id,
            client.info().display_name,
            info.roster.len()
        );

        if info.roster.len() < expected {
            client.admitted(&info);
            return Ok(());
        }

        let seats = self.seat_players(&mut info);
        client.admitted(&info);
        self.spawn_worker(&mut info, seats)
    }

    /// Seat a server-side bot.
    pub fn add_bot(self: &Arc<Self>) -> Result<ClientInfo, SessionError> {
        let bot = Arc::new(BotClient::new(self.registry.next_client_id()));
        let info = bot.info();
        self.add_client(bot)?;
        Ok(info)
    }

    /// Remove a participant. Abandoning a running match ends it for everyone.
    pub fn remove_client(&self, id: ClientId) -> Result<(), SessionError> {
        let mut info = lock(&self.info);
        let member = self.roster.remove(id).ok_or(SessionError::NotAMember)?;
        info.remove_client_info(id);

        let seats = self.seats.get();
        let seat = seats.and_then(|s| s.seat_of(id));
        let player = seats
            .zip(seat)
            .and_then(|(s, i)| s.get(i))
            .map(|s| s.info.clone())
            .unwrap_or_else(|| member.info());
        info!("session {}: {} left", self.id, player.display_name);
        self.roster.broadcast(&Response::SomeoneLeft { player });

        let audience = self.roster.has_humans();
        match info.state {
            GameState::WaitingForPlayers => {
                if !audience {
                    info!("session {}: abandoned before start", self.id);
                    info.state = GameState::Ended;
                    self.ended.store(true, Ordering::SeqCst);
                    self.registry.deregister(self.id);
                }
            }
            GameState::Started => {
                let finished = seats
                    .zip(seat)
                    .and_then(|(s, i)| s.get(i))
                    .filter(|s| s.has_finished());
                match (finished, seat) {
                    (Some(vacated), Some(index)) if audience => {
                        vacated.vacate();
                        let _ = self.queue.send(MatchInput::Vacated { seat: index });
                    }
                    (Some(vacated), _) => {
                        info!("session {}: only bots left, ending match", self.id);
                        vacated.vacate();
                        let _ = self.queue.send(MatchInput::Deserted);
                    }
                    _ => {
                        warn!("session {}: unfinished player left, ending match", self.id);
                        self.finish(&mut info, Vec::new());
                        let _ = self.queue.send(MatchInput::Abort);
                    }
                }
            }
            GameState::Ended => {}
        }
        Ok(())
    }

    /// Queue a gameplay request. Dropped unless the match is running.
    pub fn submit(&self, from: ClientId, request: GameplayRequest) {
        if self.state() != GameState::Started {
            debug!("session {}: dropping {request:?} from {from:?}, match not running", self.id);
            return;
        }
        let _ = self.queue.send(MatchInput::Gameplay { from, request });
    }

    /// Stop the match without announcing anything.
    pub fn abort(&self) {
        let mut info = lock(&self.info);
        if info.state != GameState::Ended {
            info.state = GameState::Ended;
            self.ended.store(true, Ordering::SeqCst);
            self.registry.deregister(self.id);
        }
        drop(info);
        let _ = self.queue.send(MatchInput::Abort);
    }

    /// Wait for the match worker, if one was started.
    pub fn join_worker(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("session {}: match worker panicked", self.id);
            }
        }
    }

    fn seat_players(&self, info: &mut GameInfo) -> Arc<SeatTable> {
        let seats = Arc::new(SeatTable::new(&self.roster.snapshot()));
        for (entry, seat) in info.roster.iter_mut().zip(seats.iter()) {
            entry.player_id = seat.info.player_id;
        }
        info.state = GameState::Started;
        let _ = self.seats.set(Arc::clone(&seats));
        seats
    }

    fn spawn_worker(
        self: &Arc<Self>,
        info: &mut GameInfo,
        seats: Arc<SeatTable>,
    ) -> Result<(), SessionError> {
        let Some(inbox) = lock(&self.inbox).take() else {
            return Ok(());
        };
        let worker = MatchWorker::new(Arc::clone(self), info.game_type, seats, inbox);
        let spawned = thread::Builder::new()
            .name(format!("match-{}", self.id.0))
            .spawn(move || worker.run());
        match spawned {
            Ok(handle) => {
                info!("session {}: match started", self.id);
                *lock(&self.worker) = Some(handle);
                Ok(())
            }
            Err(e) => {
                error!("session {}: cannot start match worker: {e}", self.id);
                self.finish(info, Vec::new());
                Err(SessionError::WorkerSpawn(e))
            }
        }
    }

    fn finish_match(&self, placings: Vec<ClientInfo>) {
        let mut info = lock(&self.info);
        self.finish(&mut info, placings);
    }

    fn finish(&self, info: &mut GameInfo, placings: Vec<ClientInfo>) {
        if info.state == GameState::Ended {
            return;
        }
        info.state = GameState::Ended;
        self.ended.store(true, Ordering::SeqCst);
        info!("session {}: match ended", self.id);
        self.registry.deregister(self.id);
        self.roster.broadcast(&Response::GameEnded { placings });
    }
}

enum TurnState {
    Idle(usize),
    AwaitingTurnEnd(usize),
    Ended,
}

enum TurnFlow {
    Continue,
    EndTurn,
}

/// How a turn left the worker.
enum TurnOutcome {
    Done,
    /// Only bots are left; stop and report the placings so far.
    Deserted,
    Cancelled,
}

/// Owner of all in-match state; runs on the match thread.
struct MatchWorker {
    handler: Arc<GameHandler>,
    seats: Arc<SeatTable>,
    inbox: Receiver<MatchInput>,
    board: Box<dyn BoardModel>,
    players: Vec<Player>,
    rng: StdRng,
    bot: Box<dyn BotStrategy>,
}

impl MatchWorker {
    fn new(
        handler: Arc<GameHandler>,
        game_type: GameType,
        seats: Arc<SeatTable>,
        inbox: Receiver<MatchInput>,
    ) -> Self {
        let options = &handler.options;
        let board = (options.board_factory)(BoardVariant::from(game_type));
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let bot = (options.bot_factory)();
        Self {
            handler,
            seats,
            inbox,
            board,
            players: Vec::new(),
            rng,
            bot,
        }
    }

    /// One `Player` per seat, pawns placed by the board.
    fn create_game(&mut self) -> bool {
        for seat in self.seats.iter() {
            let Some(slot) = self.board.add_player() else {
                return false;
            };
            let mut player = Player::new(seat.client.id(), slot.corner);
            player.attach_pawns(slot.pawns);
            self.players.push(player);
        }
        true
    }

    fn run(mut self) {
        let id = self.handler.id;
        if !self.create_game() {
            error!("session {id}: board has fewer seats than players");
            self.handler.finish_match(Vec::new());
            return;
        }
        self.broadcast(Response::GameStarted {
            players: self.seats.infos(),
        });

        let seat_count = self.players.len();
        let mut state = TurnState::Idle(self.rng.random_range(0..seat_count));
        loop {
            state = match state {
                TurnState::Idle(start) => {
                    if self.handler.is_ended() {
                        return;
                    }
                    match self.next_playable(start) {
                        Some(seat) if self.board.match_in_progress() => {
                            debug!("session {id}: seat {seat} to move");
                            self.broadcast(Response::StartTurn {
                                player: self.seat_info(seat),
                            });
                            TurnState::AwaitingTurnEnd(seat)
                        }
                        _ => TurnState::Ended,
                    }
                }
                TurnState::AwaitingTurnEnd(seat) => {
                    let outcome = if self.seats[seat].client.is_bot() {
                        self.play_bot_turn(seat)
                    } else {
                        self.await_turn_end(seat)
                    };
                    match outcome {
                        TurnOutcome::Done => TurnState::Idle((seat + 1) % seat_count),
                        TurnOutcome::Deserted => TurnState::Ended,
                        TurnOutcome::Cancelled => {
                            debug!("session {id}: match worker cancelled");
                            return;
                        }
                    }
                }
                TurnState::Ended => break,
            };
        }

        let placings = self
            .board
            .placings()
            .into_iter()
            .map(|seat| self.seat_info(seat))
            .collect();
        self.handler.finish_match(placings);
    }

    fn next_playable(&self, start: usize) -> Option<usize> {
        let seat_count = self.players.len();
        (0..seat_count)
            .map(|offset| (start + offset) % seat_count)
            .find(|&seat| {
                !self.board.player_has_finished(seat) && !self.seats[seat].is_vacated()
            })
    }

    /// Dispatch the owner's requests until the turn ends.
    fn await_turn_end(&mut self, seat: usize) -> TurnOutcome {
        let owner = self.players[seat].client_id;
        loop {
            match self.inbox.recv() {
                Ok(MatchInput::Gameplay { from, request }) => {
                    if from != owner {
                        debug!(
                            "session {}: dropping {request:?} from {from:?}, not their turn",
                            self.handler.id
                        );
                        continue;
                    }
                    if let TurnFlow::EndTurn = self.dispatch(seat, request) {
                        return TurnOutcome::Done;
                    }
                }
                Ok(MatchInput::Vacated { seat: vacated }) => {
                    if vacated == seat {
                        self.end_turn(seat);
                        return TurnOutcome::Done;
                    }
                }
                Ok(MatchInput::Deserted) => return TurnOutcome::Deserted,
                Ok(MatchInput::Abort) | Err(_) => return TurnOutcome::Cancelled,
            }
        }
    }

    fn dispatch(&mut self, seat: usize, request: GameplayRequest) -> TurnFlow {
        match request {
            GameplayRequest::PossibleMoves { pawn } => {
                self.send_possible_moves(seat, pawn);
                TurnFlow::Continue
            }
            GameplayRequest::Move { from, to } => {
                self.apply_move(seat, from, to);
                TurnFlow::Continue
            }
            GameplayRequest::EndTurn => {
                self.end_turn(seat);
                TurnFlow::EndTurn
            }
        }
    }

    /// Apply and announce a move. Rejected moves change nothing and announce
    /// nothing.
    fn apply_move(&mut self, seat: usize, from: Position, to: Position) -> bool {
        let was_finished = self.seats[seat].has_finished();
        if let Err(e) = self.board.apply_move(seat, from, to) {
            debug!("session {}: seat {seat}: {e}", self.handler.id);
            return false;
        }
        self.players[seat].move_type = MoveType::Next;
        let player = self.seat_info(seat);
        self.broadcast(Response::Move {
            player: player.clone(),
            from,
            to,
        });
        if was_finished {
            // Already home: shuffling inside the goal arm wins nothing new.
            self.send_possible_moves(seat, to);
        } else if self.players[seat].has_finished(self.board.as_ref()) {
            self.seats[seat].mark_finished();
            info!("session {}: {} finished", self.handler.id, player.display_name);
            self.broadcast(Response::Win { player });
        } else {
            self.send_possible_moves(seat, to);
        }
        true
    }

    fn end_turn(&mut self, seat: usize) {
        self.broadcast(Response::EndTurn {
            player: self.seat_info(seat),
        });
        self.board.end_turn(seat);
        self.players[seat].end_turn();
    }

    fn send_possible_moves(&self, seat: usize, from: Position) {
        let destinations = self.board.legal_destinations(seat, from);
        self.seats[seat]
            .client
            .send(Response::PossibleMoves { from, destinations });
    }

    /// Greedy bot turn: the best move, then follow-up jumps for as long as
    /// each brings the pawn strictly closer to the goal.
    fn play_bot_turn(&mut self, seat: usize) -> TurnOutcome {
        let corner = self.players[seat].corner;
        let pawns: Vec<Position> = self.players[seat]
            .pawns
            .iter()
            .filter_map(|id| self.board.pawn(*id))
            .map(|p| p.position)
            .collect();
        let board = self.board.as_ref();
        let mut next = self
            .bot
            .best_move(corner, &pawns, &|from| board.legal_destinations(seat, from));
        if next.is_none() {
            debug!("session {}: bot in seat {seat} passes", self.handler.id);
        }

        while let Some(bot_move) = next.take() {
            self.pause_for_spectators();
            if !self.apply_move(seat, bot_move.from, bot_move.to) {
                warn!(
                    "session {}: bot in seat {seat} chose an illegal move",
                    self.handler.id
                );
                break;
            }
            if self.players[seat].has_finished(self.board.as_ref()) {
                break;
            }
            let options = self.board.legal_destinations(seat, bot_move.to);
            next = self
                .bot
                .best_continuation(corner, &options)
                .filter(|m| goal_distance(corner, m.to) < goal_distance(corner, bot_move.to));
        }

        self.pause_for_spectators();
        self.end_turn(seat);
        self.discard_queued_input()
    }

    /// Input queued while a bot held the turn came from non-owners; only
    /// control messages matter.
    fn discard_queued_input(&mut self) -> TurnOutcome {
        loop {
            match self.inbox.try_recv() {
                Ok(MatchInput::Gameplay { from, request }) => {
                    debug!(
                        "session {}: dropping {request:?} from {from:?}, not their turn",
                        self.handler.id
                    );
                }
                Ok(MatchInput::Vacated { .. }) => {}
                Ok(MatchInput::Deserted) => return TurnOutcome::Deserted,
                Ok(MatchInput::Abort) | Err(TryRecvError::Disconnected) => {
                    return TurnOutcome::Cancelled;
                }
                Err(TryRecvError::Empty) => return TurnOutcome::Done,
            }
        }
    }

    fn pause_for_spectators(&self) {
        let delay = self.handler.options.bot_move_delay;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    fn seat_info(&self, seat: usize) -> ClientInfo {
        self.seats[seat].info.clone()
    }

    fn broadcast(&self, response: Response) {
        self.handler.roster.broadcast(&response);
    }
}
