//! LAN blackjack dealer.
//!
//! Advertises itself over UDP broadcast and plays one independent session
//! per TCP connection.

use anyhow::{Error, anyhow};
use ctrlc::set_handler;
use log::{info, warn};
use pb_server::{
    config::{AppConfig, Overrides},
    logging, metrics,
};
use pico_args::Arguments;
use private_blackjack::Server;
use tokio::sync::mpsc;

const HELP: &str = "\
Run a LAN blackjack dealer

USAGE:
  pb_server [OPTIONS]

OPTIONS:
  --bind            IP:PORT  Game listener bind address        [default: env SERVER_BIND or 0.0.0.0:0]
  --name            NAME     Advertised server name            [default: env SERVER_NAME or Blackijecky]
  --discovery-port  PORT     UDP port offers are sent to       [default: env DISCOVERY_PORT or 13122]
  --broadcast       IP|off   Offer destination address         [default: env BROADCAST_ADDR or 255.255.255.255]
  --seed            N        Seed decks for reproducible games [default: env GAME_SEED or random]
  --metrics         IP:PORT  Serve Prometheus metrics here     [default: env METRICS_BIND or disabled]

FLAGS:
  -h, --help                 Print help information

ENVIRONMENT:
  BROADCAST_INTERVAL_MS      Milliseconds between offers       [default: 1000]
  SESSION_TIMEOUT_SECS       Idle limit per session read/write [default: 60]
  MAX_ROUNDS                 Largest round count accepted      [default: 255]
  RUST_LOG                   Log filter                        [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        name: pargs.opt_value_from_str("--name")?,
        discovery_port: pargs.opt_value_from_str("--discovery-port")?,
        broadcast: pargs.opt_value_from_str("--broadcast")?,
        seed: pargs.opt_value_from_str("--seed")?,
        metrics: pargs.opt_value_from_str("--metrics")?,
    };
    let remaining = pargs.finish();

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();
    if !remaining.is_empty() {
        warn!("Ignoring unexpected arguments: {remaining:?}");
    }

    let config = AppConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics {
        metrics::init_metrics(addr).map_err(|e| anyhow!(e))?;
        info!("Serving metrics at http://{addr}/metrics");
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            logging::log_session_event(&event);
            metrics::record(&event);
        }
    });

    let server = Server::bind(config.server.clone())
        .await
        .map_err(|e| anyhow!("Failed to bind to {}: {}", config.server.bind, e))?
        .with_events(events_tx);
    let addr = server.local_addr()?;
    match config.server.broadcast {
        Some(target) => info!(
            "Server '{}' listening on {addr}, advertising to {target}. Press Ctrl+C to stop.",
            config.server.name
        ),
        None => info!(
            "Server '{}' listening on {addr} without advertising. Press Ctrl+C to stop.",
            config.server.name
        ),
    }

    server.run().await?;

    Ok(())
}
