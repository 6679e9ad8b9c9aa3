// CLI entry point for the Sternhalma session server.
//
// Reads an optional JSON config file, overlays command-line flags, installs
// the logger (level `info` unless `RUST_LOG` says otherwise) and serves until
// Ctrl+C. See `server.rs` for the networking architecture.

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Context;
use clap::Parser;
use halma_server::{ServerConfig, start_server};
use log::info;

/// Sternhalma multiplayer session server
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Address to bind
    #[arg(long)]
    bind: Option<String>,
    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,
    /// Seed for picking starting players
    #[arg(long)]
    seed: Option<u64>,
    /// Pause between bot moves, in milliseconds
    #[arg(long)]
    bot_delay_ms: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        if let Some(delay) = self.bot_delay_ms {
            config.bot_move_delay_ms = delay;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    args.apply(&mut config);

    let (handle, addr) =
        start_server(&config, config.match_options()).context("failed to start server")?;
    info!("Sternhalma server on {addr}, press Ctrl+C to stop");

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("failed to install Ctrl+C handler")?;
    let _ = stop_rx.recv();

    info!("shutting down");
    handle.stop();
    Ok(())
}
