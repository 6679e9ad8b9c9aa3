// Session metadata for discovery and lobby UIs.
//
// `GameInfo` is a plain snapshot: the server's `GameHandler` owns the live
// copy and mutates it on join, leave, start and end; everything else (lobby
// listings, `Joined` replies) receives clones. It carries no in-match state
// such as pawns or the current turn.

use serde::{Deserialize, Serialize};

use crate::types::{ClientId, ClientInfo, GameState, GameType, SessionId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: SessionId,
    pub name: String,
    pub game_type: GameType,
    pub state: GameState,
    /// Connected participants in join order.
    pub roster: Vec<ClientInfo>,
}

impl GameInfo {
    pub fn new(id: SessionId, name: impl Into<String>, game_type: GameType) -> Self {
        Self {
            id,
            name: name.into(),
            game_type,
            state: GameState::WaitingForPlayers,
            roster: Vec::new(),
        }
    }

    pub fn add_client_info(&mut self, info: ClientInfo) {
        self.roster.push(info);
    }

    /// Removes the entry for `connection_id`, returning it if present.
    pub fn remove_client_info(&mut self, connection_id: ClientId) -> Option<ClientInfo> {
        let index = self
            .roster
            .iter()
            .position(|info| info.connection_id == connection_id)?;
        Some(self.roster.remove(index))
    }

    pub fn waits_for_players(&self) -> bool {
        self.state == GameState::WaitingForPlayers
            && self.roster.len() < self.game_type.expected_players()
    }
}
