// Participants of a session, as seen by the `GameHandler`.
//
// `ClientSession` is the seam between a match and whatever sits behind a
// seat. Sending never blocks and never fails from the caller's point of view:
// a remote client's frames go to its writer thread through an unbounded
// channel, and a dead connection is noticed by its reader thread, which then
// removes the client from the session.
//
// - `RemoteClient`: a TCP connection (see `server.rs`).
// - `BotClient`: a server-side seat played by a `BotStrategy` on the match
//   worker; it swallows everything sent to it.

use std::sync::mpsc::Sender;

use halma_protocol::{ClientId, ClientInfo, GameInfo, Response, ServerMessage};

pub trait ClientSession: Send + Sync {
    fn id(&self) -> ClientId;

    fn info(&self) -> ClientInfo;

    fn send(&self, response: Response);

    /// Called once the session has accepted this participant.
    fn admitted(&self, _game: &GameInfo) {}

    fn is_bot(&self) -> bool {
        false
    }
}

pub struct RemoteClient {
    info: ClientInfo,
    outbox: Sender<ServerMessage>,
}

impl RemoteClient {
    pub fn new(info: ClientInfo, outbox: Sender<ServerMessage>) -> Self {
        Self { info, outbox }
    }
}

impl ClientSession for RemoteClient {
    fn id(&self) -> ClientId {
        self.info.connection_id
    }

    fn info(&self) -> ClientInfo {
        self.info.clone()
    }

    fn send(&self, response: Response) {
        // A closed outbox means the connection is already going away.
        let _ = self.outbox.send(ServerMessage::Game(response));
    }

    fn admitted(&self, game: &GameInfo) {
        let _ = self.outbox.send(ServerMessage::Joined { game: game.clone() });
    }
}

pub struct BotClient {
    info: ClientInfo,
}

impl BotClient {
    pub fn new(id: ClientId) -> Self {
        Self {
            info: ClientInfo::new(id, format!("Bot {}", id.0)),
        }
    }
}

impl ClientSession for BotClient {
    fn id(&self) -> ClientId {
        self.info.connection_id
    }

    fn info(&self) -> ClientInfo {
        self.info.clone()
    }

    fn send(&self, _response: Response) {}

    fn is_bot(&self) -> bool {
        true
    }
}
