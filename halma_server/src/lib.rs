// halma_server: multiplayer session server for Sternhalma.
//
// Players connect over TCP, meet in a lobby, and play matches of 2, 3, 4 or
// 6 seats (humans or bots). Each match is run by a `GameHandler` with its own
// worker thread; the board rules come from `halma_board` and the wire format
// from `halma_protocol`.
//
// Module overview:
// - `game_handler.rs`: the orchestrator. Lifecycle (join, leave, start, end),
//                      the inbound request queue and the match worker's turn
//                      loop.
// - `player.rs`:       per-seat state the worker keeps (`Player`, `MoveType`).
// - `roster.rs`:       copy-on-write broadcast `Roster` and the `SeatTable`.
// - `participant.rs`:  `ClientSession` trait; `RemoteClient` and `BotClient`.
// - `bot.rs`:          `BotStrategy` and the greedy `EasyBot`.
// - `registry.rs`:     `SessionRegistry`, live sessions and id counters.
// - `server.rs`:       TCP listener, per-connection reader/writer threads,
//                      lobby commands.
// - `client.rs`:       `NetClient`, a blocking client with a background reader.
// - `config.rs`:       `ServerConfig` (file + CLI) and `MatchOptions`.
// - `error.rs`:        `SessionError`, `ConfigError`.
//
// The server can run as the standalone `halma-server` binary (`main.rs`) or be
// embedded through `start_server`.

pub mod bot;
pub mod client;
pub mod config;
pub mod error;
pub mod game_handler;
pub mod participant;
pub mod player;
pub mod registry;
pub mod roster;
pub mod server;

#[cfg(test)]
mod test_util;

pub use config::{MatchOptions, ServerConfig};
pub use game_handler::GameHandler;
pub use registry::SessionRegistry;
pub use server::{ServerHandle, start_server};
