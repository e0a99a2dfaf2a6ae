//! Drives a [`Client`] through a whole session with a [`Strategy`].

use anyhow::Error;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::decision::Strategy;
use crate::{
    game::{Action, Tally},
    net::client::{Client, Summary, Turn},
};

/// What a bot observed during one session.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SessionReport {
    /// Outcomes as tallied locally from each round result.
    pub tally: Tally,
    /// Totals as reported by the server.
    pub summary: Summary,
    pub hits: u32,
    pub stands: u32,
}

impl SessionReport {
    /// Whether the local tally agrees with the server's summary.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.summary.wins == self.tally.total_wins()
            && self.summary.losses == self.tally.total_losses()
            && self.summary.pushes == self.tally.pushes
    }
}

/// Request `rounds` rounds and play all of them, asking `strategy` at every
/// prompt.
///
/// # Errors
///
/// Returns an error if the connection fails or the server sends anything
/// out of order.
pub fn play_session(
    client: &mut Client,
    rounds: u32,
    strategy: &mut dyn Strategy,
) -> Result<SessionReport, Error> {
    client.request_rounds(rounds)?;
    let mut report = SessionReport::default();
    for round in 1..=rounds {
        let opening = client.recv_opening()?;
        let mut hand = opening.player;
        loop {
            match client.recv_turn()? {
                Turn::Decide => {
                    let action = strategy.decide(&hand, opening.up_card);
                    match action {
                        Action::Hit => report.hits += 1,
                        Action::Stand => report.stands += 1,
                    }
                    client.take_action(action)?;
                }
                Turn::Drew(card) => hand.push(card),
                Turn::Settled(result) => {
                    debug!(
                        "{} round {round}/{rounds}: {} with {} against {}",
                        strategy.name(),
                        result.outcome,
                        result.player,
                        result.dealer
                    );
                    report.tally.record(result.outcome);
                    break;
                }
            }
        }
    }
    report.summary = client.recv_summary()?;
    if !report.is_consistent() {
        warn!(
            "server summary {:?} disagrees with local tally {}",
            report.summary, report.tally
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;
    use crate::{
        bot::decision::{BasicStrategy, DealerMimic, RandomStrategy},
        net::{
            server::{Server, ServerConfig},
            session::SessionConfig,
        },
    };

    async fn spawn_server(seed: u64) -> (SocketAddr, tokio::task::JoinHandle<std::io::Result<()>>) {
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            broadcast: None,
            session: SessionConfig {
                seed: Some(seed),
                ..SessionConfig::default()
            },
            ..ServerConfig::default()
        };
        let server = Server::bind(config).await.unwrap();
        let addr = server.local_addr().unwrap();
        (addr, tokio::spawn(server.run()))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dealer_mimic_plays_full_session() {
        let (addr, server) = spawn_server(11).await;
        let report = tokio::task::spawn_blocking(move || {
            let mut client = Client::connect(&addr).unwrap();
            play_session(&mut client, 10, &mut DealerMimic).unwrap()
        })
        .await
        .unwrap();
        server.abort();

        assert!(report.is_consistent());
        assert_eq!(report.summary.rounds(), 10);
        assert_eq!(report.tally.rounds(), 10);
        // Every round ends with exactly one stand unless the player busts
        // or is dealt a natural.
        assert!(report.stands <= 10);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn strategies_agree_with_server_summary() {
        let (addr, server) = spawn_server(99).await;
        let reports = tokio::task::spawn_blocking(move || {
            let mut strategies: Vec<Box<dyn Strategy>> = vec![
                Box::new(BasicStrategy),
                Box::new(RandomStrategy::new(Some(3))),
            ];
            strategies
                .iter_mut()
                .map(|strategy| {
                    let mut client = Client::connect(&addr).unwrap();
                    play_session(&mut client, 6, strategy.as_mut()).unwrap()
                })
                .collect::<Vec<_>>()
        })
        .await
        .unwrap();
        server.abort();

        for report in reports {
            assert!(report.is_consistent());
            assert_eq!(report.summary.rounds(), 6);
        }
    }
}
