// Server and match configuration.
//
// `ServerConfig` is the deployable part: a JSON file (every field optional,
// falling back to `Default`) that the binary overlays with CLI flags.
// `MatchOptions` is what each `GameHandler` is built with; it carries the
// injectable collaborators (board factory, bot strategy) next to the plain
// knobs so tests can swap in scripted boards and fixed seeds.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use halma_board::{BoardModel, BoardVariant, StarBoard};
use serde::{Deserialize, Serialize};

use crate::bot::{BotStrategy, EasyBot};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Prefix for the names of created sessions.
    pub session_name: String,
    /// Seed for starting-player selection. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    /// Pause between consecutive bot moves so humans can follow them.
    pub bot_move_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".into(),
            port: 7979,
            session_name: "Sternhalma".into(),
            rng_seed: None,
            bot_move_delay_ms: 250,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            session_name: self.session_name.clone(),
            rng_seed: self.rng_seed,
            bot_move_delay: Duration::from_millis(self.bot_move_delay_ms),
            ..MatchOptions::default()
        }
    }
}

pub type BoardFactory = Arc<dyn Fn(BoardVariant) -> Box<dyn BoardModel> + Send + Sync>;

pub type BotFactory = fn() -> Box<dyn BotStrategy>;

#[derive(Clone)]
pub struct MatchOptions {
    pub session_name: String,
    pub board_factory: BoardFactory,
    pub rng_seed: Option<u64>,
    pub bot_move_delay: Duration,
    pub bot_factory: BotFactory,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            session_name: ServerConfig::default().session_name,
            board_factory: Arc::new(|variant: BoardVariant| -> Box<dyn BoardModel> {
                Box::new(StarBoard::new(variant))
            }),
            rng_seed: None,
            bot_move_delay: Duration::ZERO,
            bot_factory: easy_bot,
        }
    }
}

fn easy_bot() -> Box<dyn BotStrategy> {
    Box::new(EasyBot::default())
}

impl fmt::Debug for MatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchOptions")
            .field("session_name", &self.session_name)
            .field("rng_seed", &self.rng_seed)
            .field("bot_move_delay", &self.bot_move_delay)
            .finish_non_exhaustive()
    }
}
