// Core value types for the Sternhalma protocol.
//
// Lightweight newtypes and enums shared by `message.rs`, `game_info.rs`, the
// board crate (`halma_board`) and the server. IDs are server-assigned compact
// integers: `ClientId` per TCP connection, `SessionId` per match.
//
// Board coordinates live here (not in the board crate) because they cross the
// wire in every move request and response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned connection identity. Equality is the identity used for
/// roster membership and turn ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u64);

/// Session (match) identity, drawn from the registry's monotonic counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A hole on the star board, in axial coordinates on a 17×17 grid.
///
/// Adjacency is six-way: `(±1, 0)`, `(0, ±1)`, `(1, 1)` and `(-1, -1)`, so
/// Chebyshev distance is a close (never over-estimating) proxy for the number
/// of steps between two holes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `max(|dx|, |dy|)`.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the six star points. A player's corner is their *goal*; pawns start
/// on the opposite point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Corner(pub u8);

impl Corner {
    pub const COUNT: u8 = 6;

    pub fn all() -> impl Iterator<Item = Corner> {
        (0..Self::COUNT).map(Corner)
    }

    pub fn opposite(self) -> Corner {
        Corner((self.0 + Self::COUNT / 2) % Self::COUNT)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Match format. There is deliberately no five-player format: the star has no
/// symmetric five-seat layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    TwoPlayers,
    ThreePlayers,
    FourPlayers,
    SixPlayers,
}

impl GameType {
    pub fn expected_players(self) -> usize {
        match self {
            GameType::TwoPlayers => 2,
            GameType::ThreePlayers => 3,
            GameType::FourPlayers => 4,
            GameType::SixPlayers => 6,
        }
    }

    pub fn from_player_count(count: usize) -> Option<Self> {
        match count {
            2 => Some(GameType::TwoPlayers),
            3 => Some(GameType::ThreePlayers),
            4 => Some(GameType::FourPlayers),
            6 => Some(GameType::SixPlayers),
            _ => None,
        }
    }
}

/// Session lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    WaitingForPlayers,
    Started,
    Ended,
}

/// Public snapshot of a participant. `player_id` is the seat index, assigned
/// when the match starts (join order).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub connection_id: ClientId,
    pub display_name: String,
    pub player_id: Option<usize>,
}

impl ClientInfo {
    pub fn new(connection_id: ClientId, display_name: impl Into<String>) -> Self {
        Self {
            connection_id,
            display_name: display_name.into(),
            player_id: None,
        }
    }
}
