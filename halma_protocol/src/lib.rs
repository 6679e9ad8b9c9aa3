// halma_protocol: wire protocol for the Sternhalma session server.
//
// Shared by the server (`halma_server`) and its clients. No dependency on the
// board rules or on any threading model.
//
// Module overview:
// - `types.rs`:     IDs (`ClientId`, `SessionId`), `Position`, `Corner`,
//                   `GameType`, `GameState`, `ClientInfo`.
// - `game_info.rs`: `GameInfo`, the per-session discovery snapshot.
// - `message.rs`:   match-layer `GameplayRequest` / `Response` and the
//                   connection-layer `ClientMessage` / `ServerMessage`.
// - `framing.rs`:   4-byte big-endian length prefix + JSON payload over any
//                   `Read` / `Write`.
// - `error.rs`:     `ProtocolError`.
//
// JSON keeps frames debuggable with any socket tool; message volume is tiny
// (a handful of frames per move).

pub mod error;
pub mod framing;
pub mod game_info;
pub mod message;
pub mod types;

pub use error::ProtocolError;
pub use framing::{MAX_FRAME_SIZE, recv, send};
pub use game_info::GameInfo;
pub use message::{ClientMessage, GameplayRequest, Response, ServerMessage};
pub use types::{ClientId, ClientInfo, Corner, GameState, GameType, Position, SessionId};

/// Bumped whenever a message changes shape.
pub const PROTOCOL_VERSION: u32 = 1;
