//! A blocking blackjack client.
//!
//! The client speaks the line protocol directly over a `std` TCP stream. It
//! is used by the console client and the bots, and by the integration tests.

use anyhow::{Error, bail};
use serde::{Deserialize, Serialize};
use std::{
    io::{BufReader, Write},
    net::{SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::{
    messages::{ClientMessage, ServerMessage},
    utils,
};
use crate::game::{Action, Card, Hand, Outcome};

/// Default timeout for reading from the server. Generous because the server
/// only talks after the player decides.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for writing to the server.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the client sees at the start of a round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Opening {
    pub player: Hand,
    pub up_card: Card,
}

/// A settled round as reported by the server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundResult {
    pub outcome: Outcome,
    pub player: Hand,
    pub dealer: Hand,
}

/// Session totals as reported by the server.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
}

impl Summary {
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.wins + self.losses + self.pushes
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        match self.rounds() {
            0 => 0.0,
            n => f64::from(self.wins) / f64::from(n),
        }
    }
}

/// What follows a player's decision or the opening deal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Turn {
    /// The server wants another decision.
    Decide,
    /// The player drew this card after a hit.
    Drew(Card),
    /// The round is over.
    Settled(RoundResult),
}

pub struct Client {
    pub addr: SocketAddr,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    /// Connect to a dealer.
    ///
    /// This method retries with decreasing timeouts (1s, 500ms, 100ms)
    /// before giving up.
    ///
    /// # Errors
    ///
    /// Returns an error if every attempt fails.
    pub fn connect(addr: &SocketAddr) -> Result<Self, Error> {
        let mut connect_timeouts = vec![
            Duration::from_millis(100),
            Duration::from_millis(500),
            Duration::from_secs(1),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(READ_TIMEOUT))?;
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    let writer = stream.try_clone()?;
                    return Ok(Self {
                        addr: *addr,
                        reader: BufReader::new(stream),
                        writer,
                    });
                }
                _ => thread::sleep(connect_timeout),
            }
        }
        bail!("couldn't connect to {addr}")
    }

    fn send(&mut self, msg: &ClientMessage) -> Result<(), Error> {
        utils::write_line(&mut self.writer, msg)?;
        Ok(())
    }

    /// Ask for `rounds` rounds. Must be the first thing sent.
    pub fn request_rounds(&mut self, rounds: u32) -> Result<(), Error> {
        self.send(&ClientMessage::Rounds(rounds))
    }

    pub fn take_action(&mut self, action: Action) -> Result<(), Error> {
        self.send(&ClientMessage::Action(action))
    }

    /// Send a raw line, bypassing message validation.
    pub fn send_raw(&mut self, line: &str) -> Result<(), Error> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Next message from the server. A server `ERROR` becomes an error.
    pub fn recv(&mut self) -> Result<ServerMessage, Error> {
        match utils::read_line(&mut self.reader) {
            Ok(Some(line)) => match line.parse::<ServerMessage>()? {
                ServerMessage::Error(reason) => bail!("server error: {reason}"),
                msg => Ok(msg),
            },
            Ok(None) => bail!("server closed the connection"),
            Err(error) => bail!(error),
        }
    }

    pub fn recv_opening(&mut self) -> Result<Opening, Error> {
        match self.recv()? {
            ServerMessage::Deal { player, up_card } => Ok(Opening { player, up_card }),
            response => bail!("invalid server response: {response}"),
        }
    }

    /// What happens next in the current round.
    pub fn recv_turn(&mut self) -> Result<Turn, Error> {
        match self.recv()? {
            ServerMessage::ActionPrompt => Ok(Turn::Decide),
            ServerMessage::Card(card) => Ok(Turn::Drew(card)),
            ServerMessage::Result {
                outcome,
                player,
                dealer,
            } => Ok(Turn::Settled(RoundResult {
                outcome,
                player,
                dealer,
            })),
            response => bail!("invalid server response: {response}"),
        }
    }

    pub fn recv_summary(&mut self) -> Result<Summary, Error> {
        match self.recv()? {
            ServerMessage::Summary {
                wins,
                losses,
                pushes,
            } => Ok(Summary {
                wins,
                losses,
                pushes,
            }),
            response => bail!("invalid server response: {response}"),
        }
    }
}
