// Process-wide table of live sessions.
//
// One `SessionRegistry` is created by the server and handed (as an `Arc`) to
// every `GameHandler` it creates. It owns the monotonic session-id and
// client-id counters (connections and bots draw from the same one) and the
// id -> handler map used by lobby commands. A handler removes itself with
// `deregister` exactly once, when its match ends or is abandoned.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use halma_protocol::{ClientId, GameInfo, GameType, SessionId};
use log::info;

use crate::config::MatchOptions;
use crate::error::SessionError;
use crate::game_handler::GameHandler;
use crate::roster::Member;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<GameHandler>>,
    next_id: AtomicU64,
    next_client: AtomicU64,
    deregistered: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn next_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn next_client_id(&self) -> ClientId {
        ClientId(self.next_client.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Create a session with `creator` as its first participant and make it
    /// discoverable.
    pub fn create_session(
        self: &Arc<Self>,
        game_type: GameType,
        creator: Member,
        options: MatchOptions,
    ) -> Result<Arc<GameHandler>, SessionError> {
        let handler = GameHandler::new(game_type, Arc::clone(self), options);
        self.register(Arc::clone(&handler));
        if let Err(e) = handler.add_client(creator) {
            self.deregister(handler.id());
            return Err(e);
        }
        Ok(handler)
    }

    pub fn register(&self, handler: Arc<GameHandler>) {
        info!("session {} registered", handler.id());
        self.sessions.insert(handler.id(), handler);
    }

    /// Returns whether the session was still registered.
    pub fn deregister(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            self.deregistered.fetch_add(1, Ordering::SeqCst);
            info!("session {id} deregistered");
        }
        removed
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<GameHandler>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshots of every live session, by id.
    pub fn list(&self) -> Vec<GameInfo> {
        let handlers: Vec<Arc<GameHandler>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut games: Vec<GameInfo> = handlers.iter().map(|h| h.game_info()).collect();
        games.sort_by_key(|g| g.id);
        games
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions removed so far.
    pub fn deregistered_count(&self) -> u64 {
        self.deregistered.load(Ordering::SeqCst)
    }
}
