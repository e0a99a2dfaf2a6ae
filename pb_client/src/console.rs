//! Line-oriented console front end.
//!
//! Generic over its input and output so tests can script a whole session.

use anyhow::{Context, Result};
use log::{info, warn};
use private_blackjack::{
    Action, Card, Client, Hand,
    net::client::{Summary, Turn},
};
use std::{
    fmt,
    io::{BufRead, Write},
    net::SocketAddr,
    thread,
    time::Duration,
};

use crate::commands::{Command, parse_command, parse_rounds};

const COMMAND_HELP: &str = "\
  hit   (h)   take another card
  stand (s)   keep your hand
  quit  (q)   leave the table
";

/// The player walked away. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leave {
    InputClosed,
    Quit { round: u32 },
}

impl fmt::Display for Leave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputClosed => write!(f, "input closed"),
            Self::Quit { round } => write!(f, "left the table during round {round}"),
        }
    }
}

impl std::error::Error for Leave {}

pub fn format_hand(hand: &Hand) -> String {
    let cards: Vec<String> = hand.cards().iter().map(|card| card.pretty()).collect();
    format!("{} (total {})", cards.join(" "), hand.value())
}

pub fn format_summary(summary: &Summary) -> String {
    format!(
        "Finished playing {} rounds, wins={}, losses={}, ties={}, win rate={:.2}",
        summary.rounds(),
        summary.wins,
        summary.losses,
        summary.pushes,
        summary.win_rate()
    )
}

pub struct Console<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Console<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> O {
        self.output
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Leave::InputClosed.into());
        }
        Ok(line)
    }

    /// Ask until a valid round count is entered.
    pub fn prompt_rounds(&mut self) -> Result<u32> {
        loop {
            let line = self.read_line("Enter number of rounds to play (1-255): ")?;
            match parse_rounds(&line) {
                Ok(rounds) => return Ok(rounds),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    /// Ask until the player decides. `None` means they want to quit.
    fn prompt_command(&mut self) -> Result<Option<Action>> {
        loop {
            let line = self.read_line("Hit or Stand? ")?;
            match parse_command(&line) {
                Ok(Command::Act(action)) => return Ok(Some(action)),
                Ok(Command::Help) => write!(self.output, "{COMMAND_HELP}")?,
                Ok(Command::Quit) => return Ok(None),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    /// Play `rounds` rounds on `client`, prompting for every decision.
    ///
    /// # Errors
    ///
    /// Fails on connection problems, unexpected server messages, or when the
    /// player quits mid-session.
    pub fn play(&mut self, client: &mut Client, rounds: u32) -> Result<Summary> {
        client.request_rounds(rounds)?;
        for round in 1..=rounds {
            writeln!(self.output, "\n--- Round {round}/{rounds} ---")?;
            let opening = client.recv_opening()?;
            let mut hand = opening.player;
            self.show_opening(&hand, opening.up_card)?;
            loop {
                match client.recv_turn()? {
                    Turn::Decide => match self.prompt_command()? {
                        Some(action) => client.take_action(action)?,
                        None => return Err(Leave::Quit { round }.into()),
                    },
                    Turn::Drew(card) => {
                        hand.push(card);
                        writeln!(
                            self.output,
                            "You drew {}, total={}",
                            card.pretty(),
                            hand.value()
                        )?;
                    }
                    Turn::Settled(result) => {
                        writeln!(self.output, "Your hand:   {}", format_hand(&result.player))?;
                        writeln!(self.output, "Dealer hand: {}", format_hand(&result.dealer))?;
                        writeln!(self.output, "Result: {}", result.outcome)?;
                        break;
                    }
                }
            }
        }
        let summary = client.recv_summary()?;
        writeln!(self.output, "\n{}", format_summary(&summary))?;
        Ok(summary)
    }

    /// Keep locating a dealer and playing until one session completes.
    ///
    /// Failing to find or reach a dealer, or a session the dealer cuts
    /// short, is logged and retried after `retry_delay`. Only [`Leave`] ends
    /// the loop early.
    pub fn play_until_done<F>(
        &mut self,
        rounds: u32,
        retry_delay: Duration,
        mut locate: F,
    ) -> Result<Summary>
    where
        F: FnMut() -> Result<SocketAddr>,
    {
        loop {
            let attempt = locate().and_then(|addr| {
                let mut client = Client::connect(&addr)
                    .with_context(|| format!("Failed to connect to {addr}"))?;
                info!("connected to {addr}");
                self.play(&mut client, rounds)
            });
            match attempt {
                Ok(summary) => return Ok(summary),
                Err(error) if error.is::<Leave>() => return Err(error),
                Err(error) => {
                    warn!("{error:#}");
                    writeln!(self.output, "Lost the dealer, looking for another one")?;
                    thread::sleep(retry_delay);
                }
            }
        }
    }

    fn show_opening(&mut self, hand: &Hand, up_card: Card) -> Result<()> {
        writeln!(self.output, "Player cards: {}", format_hand(hand))?;
        writeln!(self.output, "Dealer shows: {}", up_card.pretty())?;
        Ok(())
    }
}
