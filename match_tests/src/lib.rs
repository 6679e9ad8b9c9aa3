// Test-only player for whole-match integration tests.
//
// Wraps the real `NetClient` (from `halma_server::client`) and a real
// `StarBoard` (from `halma_board`) kept in step with the server purely from
// broadcasts: every `Move` and `EndTurn` the client receives is replayed on
// the local board. When two clients end up with the same board, the server
// has told everyone the same story.
//
// Turns are chosen with the server's own `EasyBot`, asked through the local
// board, and the server's `PossibleMoves` answer is checked against it before
// the move is sent.
//
// See also: `tests/full_match.rs` for the scenarios.

use std::net::SocketAddr;
use std::time::Duration;

use halma_board::{BoardModel, BoardVariant, StarBoard};
use halma_protocol::{
    ClientInfo, GameType, GameplayRequest, Position, Response, ServerMessage, SessionId,
};
use halma_server::bot::{BotStrategy, EasyBot};
use halma_server::client::NetClient;

/// Longest silence tolerated while waiting for a message.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestPlayer {
    client: NetClient,
    pub board: Option<StarBoard>,
    pub players: Vec<ClientInfo>,
    pub winners: Vec<ClientInfo>,
    pub placings: Option<Vec<ClientInfo>>,
}

impl TestPlayer {
    pub fn connect(addr: SocketAddr, name: &str) -> Self {
        let client = NetClient::connect(addr, name).expect("TestPlayer::connect failed");
        Self {
            client,
            board: None,
            players: Vec::new(),
            winners: Vec::new(),
            placings: None,
        }
    }

    pub fn info(&self) -> &ClientInfo {
        self.client.info()
    }

    /// The seat this client was given at match start.
    pub fn seat(&self) -> usize {
        self.players
            .iter()
            .find(|p| p.connection_id == self.info().connection_id)
            .and_then(|p| p.player_id)
            .expect("not seated")
    }

    pub fn create_game(&mut self, game_type: GameType) -> SessionId {
        self.client.create_game(game_type).expect("create_game failed");
        match self.poll_until("Joined", |m| matches!(m, ServerMessage::Joined { .. })) {
            ServerMessage::Joined { game } => game.id,
            _ => unreachable!(),
        }
    }

    pub fn join_game(&mut self, id: SessionId) {
        self.client.join_game(id).expect("join_game failed");
        self.poll_until("Joined", |m| matches!(m, ServerMessage::Joined { .. }));
    }

    pub fn add_bot(&mut self) {
        self.client.add_bot().expect("add_bot failed");
    }

    /// Block until the next `StartTurn`, replaying everything before it.
    pub fn wait_for_turn(&mut self) -> ClientInfo {
        match self.poll_until("StartTurn", |m| {
            matches!(m, ServerMessage::Game(Response::StartTurn { .. }))
        }) {
            ServerMessage::Game(Response::StartTurn { player }) => player,
            _ => unreachable!(),
        }
    }

    /// Block until the match is over and return the placings.
    pub fn wait_for_end(&mut self) -> Vec<ClientInfo> {
        self.poll_until("GameEnded", |m| {
            matches!(m, ServerMessage::Game(Response::GameEnded { .. }))
        });
        self.placings.clone().unwrap_or_default()
    }

    /// Play one turn as the current player: one move picked by `EasyBot` on
    /// the local board, then `EndTurn`. Returns the move, or `None` when the
    /// local board offers nothing and the turn was passed.
    pub fn play_turn(&mut self) -> Option<(Position, Position)> {
        let seat = self.seat();
        let chosen = {
            let board = self.board.as_ref().expect("match not started");
            let corner = board.corner(seat).expect("seat without corner");
            let pawns: Vec<Position> = board.pawns_of(seat).map(|p| p.position).collect();
            EasyBot::default().best_move(corner, &pawns, &|from| {
                board.legal_destinations(seat, from)
            })
        };

        let played = chosen.map(|m| {
            let expected = self
                .board
                .as_ref()
                .map(|b| b.legal_destinations(seat, m.from))
                .unwrap_or_default();
            self.send(GameplayRequest::PossibleMoves { pawn: m.from });
            let offered = self.poll_until("PossibleMoves", |msg| {
                matches!(msg, ServerMessage::Game(Response::PossibleMoves { .. }))
            });
            assert_eq!(
                offered,
                ServerMessage::Game(Response::PossibleMoves {
                    from: m.from,
                    destinations: expected,
                }),
                "server and local board disagree on the moves from {:?}",
                m.from
            );

            self.send(GameplayRequest::Move {
                from: m.from,
                to: m.to,
            });
            let me = self.info().connection_id;
            self.poll_until("own Move", |msg| {
                matches!(msg, ServerMessage::Game(Response::Move { player, .. })
                    if player.connection_id == me)
            });
            (m.from, m.to)
        });

        self.send(GameplayRequest::EndTurn);
        let me = self.info().connection_id;
        self.poll_until("own EndTurn", |msg| {
            matches!(msg, ServerMessage::Game(Response::EndTurn { player })
                if player.connection_id == me)
        });
        played
    }

    /// Pawn positions per seat on the local board, for comparing mirrors.
    pub fn snapshot(&self) -> Vec<Vec<Position>> {
        let board = self.board.as_ref().expect("match not started");
        (0..board.seat_count())
            .map(|seat| {
                let mut positions: Vec<Position> =
                    board.pawns_of(seat).map(|p| p.position).collect();
                positions.sort();
                positions
            })
            .collect()
    }

    /// Send Goodbye and close the connection.
    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }

    fn send(&mut self, request: GameplayRequest) {
        self.client
            .send_gameplay(request)
            .expect("send_gameplay failed");
    }

    /// Replay messages until one matches `pred`, then return it.
    fn poll_until(
        &mut self,
        what: &str,
        pred: impl Fn(&ServerMessage) -> bool,
    ) -> ServerMessage {
        loop {
            let Some(message) = self.client.recv_timeout(POLL_TIMEOUT) else {
                panic!("{} timed out waiting for {what}", self.info().display_name);
            };
            self.absorb(&message);
            if pred(&message) {
                return message;
            }
        }
    }

    fn absorb(&mut self, message: &ServerMessage) {
        let ServerMessage::Game(response) = message else {
            return;
        };
        match response {
            Response::GameStarted { players } => {
                let variant = BoardVariant::for_player_count(players.len())
                    .expect("unsupported player count");
                let mut board = StarBoard::new(variant);
                for _ in players {
                    board.add_player().expect("board full");
                }
                self.board = Some(board);
                self.players = players.clone();
            }
            Response::Move { player, from, to } => {
                let seat = player.player_id.expect("mover without seat");
                let board = self.board.as_mut().expect("Move before GameStarted");
                if let Err(e) = board.apply_move(seat, *from, *to) {
                    panic!("broadcast move {from:?} -> {to:?} is illegal locally: {e}");
                }
            }
            Response::EndTurn { player } => {
                let seat = player.player_id.expect("player without seat");
                if let Some(board) = self.board.as_mut() {
                    board.end_turn(seat);
                }
            }
            Response::Win { player } => self.winners.push(player.clone()),
            Response::GameEnded { placings } => self.placings = Some(placings.clone()),
            _ => {}
        }
    }
}
