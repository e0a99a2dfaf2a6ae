//! Automated blackjack players.
//!
//! Finds a dealer, runs a batch of concurrent bots against it with one
//! strategy, and prints a JSON report of what happened.

use anyhow::{Error, bail};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use private_blackjack::{
    Client, DiscoveryConfig,
    bot::{StrategyKind, play_session},
    discovery::{self, DISCOVERY_PORT, DISCOVERY_TIMEOUT},
    net::session::MAX_ROUNDS,
};
use std::{net::SocketAddr, thread, time::Duration};

mod report;

use report::{BotResult, RunReport};

const HELP: &str = "\
Run automated blackjack players against a dealer

USAGE:
  pb_bots [OPTIONS]

OPTIONS:
  --bots            N                    Concurrent bots           [default: 4]
  --rounds          N                    Rounds per bot (1-255)    [default: 10]
  --strategy        dealer|basic|random  Decision strategy         [default: basic]
  --seed            N                    Seed for random strategy  [default: random]
  --server          IP:PORT              Skip discovery and connect here
  --discovery-port  PORT                 UDP port for offers       [default: 13122]
  --timeout         SECS                 Discovery timeout         [default: 5]

FLAGS:
  -h, --help                             Print help information
";

struct Args {
    bots: usize,
    rounds: u32,
    strategy: StrategyKind,
    seed: u64,
    server: Option<SocketAddr>,
    discovery: DiscoveryConfig,
}

fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bots: pargs.opt_value_from_str("--bots")?.unwrap_or(4),
        rounds: pargs.opt_value_from_str("--rounds")?.unwrap_or(10),
        strategy: pargs
            .opt_value_from_str("--strategy")?
            .unwrap_or(StrategyKind::Basic),
        seed: pargs
            .opt_value_from_str("--seed")?
            .unwrap_or_else(rand::random),
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

    if args.bots == 0 {
        bail!("--bots must be at least 1");
    }
    if !(1..=MAX_ROUNDS).contains(&args.rounds) {
        bail!("--rounds must be between 1 and {MAX_ROUNDS}");
    }

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let server = match args.server {
        Some(addr) => addr,
        None => {
            let endpoint = discovery::discover(&args.discovery)?;
            info!("Found dealer '{}' at {}", endpoint.name, endpoint.addr);
            endpoint.addr
        }
    };

    info!(
        "Running {} {} bot(s) for {} round(s) each against {server}",
        args.bots, args.strategy, args.rounds
    );
    let handles: Vec<_> = (0..args.bots)
        .map(|bot| {
            let rounds = args.rounds;
            let mut strategy = args.strategy.build(Some(args.seed.wrapping_add(bot as u64)));
            thread::spawn(move || {
                let result = Client::connect(&server)
                    .and_then(|mut client| play_session(&mut client, rounds, strategy.as_mut()));
                if let Err(error) = &result {
                    warn!("bot {bot} failed: {error:#}");
                }
                BotResult::new(bot, result)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (bot, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(result) => results.push(result),
            Err(_) => results.push(BotResult::new(bot, Err(Error::msg("bot thread panicked")))),
        }
    }

    let report = RunReport::new(
        server,
        args.strategy.to_string(),
        args.seed,
        args.rounds,
        results,
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failed > 0 {
        bail!("{} of {} bot(s) failed", report.failed, args.bots);
    }
    Ok(())
}
