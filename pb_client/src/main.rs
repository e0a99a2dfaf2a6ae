//! A console blackjack client.
//!
//! The client listens for a dealer's UDP offer (or takes an address on the
//! command line), connects, asks for a number of rounds and plays them
//! interactively. Without `--server` it goes back to listening whenever a
//! dealer can't be found or drops the session.

use anyhow::{Context, Result};
use log::info;
use pico_args::Arguments;
use private_blackjack::{
    Client, DiscoveryConfig,
    discovery::{self, DISCOVERY_PORT, DISCOVERY_TIMEOUT},
    net::session::MAX_ROUNDS,
};
use std::{io, net::SocketAddr, time::Duration};

use pb_client::console::Console;

/// Pause between a failed session and the next discovery attempt.
const RETRY_DELAY: Duration = Duration::from_secs(1);

const HELP: &str = "\
Play blackjack against a dealer on the local network

USAGE:
  pb_client [OPTIONS]

OPTIONS:
  --rounds          N        Rounds to play (1-255)           [default: prompt]
  --server          IP:PORT  Skip discovery and connect here
  --discovery-port  PORT     UDP port to listen for offers on [default: 13122]
  --timeout         SECS     How long to wait for an offer    [default: 5]

FLAGS:
  -h, --help                 Print help information
";

struct Args {
    rounds: Option<u32>,
    server: Option<SocketAddr>,
    discovery: DiscoveryConfig,
}

fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        rounds: pargs.opt_value_from_str("--rounds")?,
        server: pargs.opt_value_from_str("--server")?,
        discovery: DiscoveryConfig {
            port: pargs
                .opt_value_from_str("--discovery-port")?
                .unwrap_or(DISCOVERY_PORT),
            timeout: pargs
                .opt_value_from_str("--timeout")?
                .map_or(DISCOVERY_TIMEOUT, Duration::from_secs),
            ..DiscoveryConfig::default()
        },
    };

    env_logger::builder().format_target(false).init();

    run(args)
}

fn run(args: Args) -> Result<()> {
    let mut console = Console::new(io::stdin().lock(), io::stdout());

    let rounds = match args.rounds {
        Some(rounds) if (1..=MAX_ROUNDS).contains(&rounds) => rounds,
        Some(rounds) => {
            println!("Number of rounds must be between 1 and {MAX_ROUNDS}, not {rounds}");
            console.prompt_rounds()?
        }
        None => console.prompt_rounds()?,
    };

    match args.server {
        Some(addr) => {
            let mut client =
                Client::connect(&addr).with_context(|| format!("Failed to connect to {addr}"))?;
            info!("connected to {addr}");
            console.play(&mut client, rounds)?;
        }
        None => {
            console.play_until_done(rounds, RETRY_DELAY, || {
                println!(
                    "Client started, listening for offer requests on UDP port {}...",
                    args.discovery.port
                );
                let endpoint = discovery::discover(&args.discovery)?;
                println!("Received offer from {} ({})", endpoint.addr.ip(), endpoint.name);
                Ok(endpoint.addr)
            })?;
        }
    }
    Ok(())
}
