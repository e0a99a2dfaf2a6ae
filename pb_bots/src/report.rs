//! JSON report of a bot run.

use private_blackjack::{Tally, bot::SessionReport};
use serde::Serialize;
use std::net::SocketAddr;

/// One bot's result: its session report, or why it failed.
#[derive(Debug, Serialize)]
pub struct BotResult {
    pub bot: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SessionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BotResult {
    pub fn new(bot: usize, result: anyhow::Result<SessionReport>) -> Self {
        match result {
            Ok(report) => Self {
                bot,
                report: Some(report),
                error: None,
            },
            Err(error) => Self {
                bot,
                report: None,
                error: Some(format!("{error:#}")),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub server: SocketAddr,
    pub strategy: String,
    pub seed: u64,
    pub rounds_per_bot: u32,
    pub completed: usize,
    pub failed: usize,
    /// Sum of every completed bot's tally.
    pub totals: Tally,
    pub win_rate: f64,
    /// Bots whose local tally disagreed with the server summary.
    pub inconsistent: Vec<usize>,
    pub bots: Vec<BotResult>,
}

impl RunReport {
    pub fn new(
        server: SocketAddr,
        strategy: String,
        seed: u64,
        rounds_per_bot: u32,
        mut bots: Vec<BotResult>,
    ) -> Self {
        bots.sort_by_key(|result| result.bot);
        let mut totals = Tally::default();
        let mut inconsistent = Vec::new();
        for result in &bots {
            if let Some(report) = &result.report {
                totals.merge(&report.tally);
                if !report.is_consistent() {
                    inconsistent.push(result.bot);
                }
            }
        }
        let completed = bots.iter().filter(|result| result.report.is_some()).count();
        Self {
            server,
            strategy,
            seed,
            rounds_per_bot,
            completed,
            failed: bots.len() - completed,
            win_rate: totals.win_rate(),
            totals,
            inconsistent,
            bots,
        }
    }
}
