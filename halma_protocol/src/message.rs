// Protocol messages between players and the session server.
//
// Two layers:
// - Match layer: `GameplayRequest` (what the turn owner may ask for) and
//   `Response` (what a match broadcasts or unicasts). These are the types the
//   server's `GameHandler` works with.
// - Connection layer: `ClientMessage` / `ServerMessage` wrap the match layer
//   together with the small lobby vocabulary (hello, list, create, join,
//   bots, leave).
//
// `GameplayRequest` deliberately carries no player identity: the server knows
// which connection a request arrived on and which seat owns the turn.

use serde::{Deserialize, Serialize};

use crate::game_info::GameInfo;
use crate::types::{ClientInfo, GameType, Position, SessionId};

/// Input a player sends during their turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameplayRequest {
    /// Ask for the legal destinations of the pawn at `pawn`.
    PossibleMoves { pawn: Position },
    /// Move one pawn one step or one jump.
    Move { from: Position, to: Position },
    /// Hand the turn to the next player.
    EndTurn,
}

/// Output of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// The match began; `players` are in seat order.
    GameStarted { players: Vec<ClientInfo> },
    StartTurn { player: ClientInfo },
    /// Unicast to the turn owner.
    PossibleMoves {
        from: Position,
        destinations: Vec<Position>,
    },
    Move {
        player: ClientInfo,
        from: Position,
        to: Position,
    },
    EndTurn { player: ClientInfo },
    /// `player` has brought every pawn home.
    Win { player: ClientInfo },
    /// Finishing order; empty when the match was aborted.
    GameEnded { placings: Vec<ClientInfo> },
    SomeoneJoined { player: ClientInfo },
    SomeoneLeft { player: ClientInfo },
}

/// Messages sent by a client connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Handshake; must be the first frame on a connection.
    Hello {
        protocol_version: u32,
        display_name: String,
    },
    ListGames,
    CreateGame { game_type: GameType },
    JoinGame { game_id: SessionId },
    /// Seat a bot in the session this connection is part of.
    AddBot,
    LeaveGame,
    Gameplay(GameplayRequest),
    Goodbye,
}

/// Messages sent by the server to a client connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    Welcome { client: ClientInfo },
    Rejected { reason: String },
    GameList { games: Vec<GameInfo> },
    /// This connection is now a participant of `game`.
    Joined { game: GameInfo },
    Left { game_id: SessionId },
    Game(Response),
}
