use std::io;
use std::path::PathBuf;

use halma_protocol::SessionId;
use thiserror::Error;

/// Misuse of a session's lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is full")]
    SessionFull,
    #[error("session has already started")]
    AlreadyStarted,
    #[error("session has ended")]
    Ended,
    #[error("already a participant of this session")]
    AlreadyJoined,
    #[error("not a participant of this session")]
    NotAMember,
    #[error("no session {0}")]
    NoSuchGame(SessionId),
    #[error("already in session {0}")]
    InAnotherGame(SessionId),
    #[error("failed to spawn match worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
