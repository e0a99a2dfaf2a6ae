//! Dealer side of one game session.
//!
//! A [`Session`] owns its connection, its random source and its tally. It
//! reads the requested round count, plays each round to completion, sends
//! the summary and closes. Whatever goes wrong stays inside the session: the
//! result is reported as a [`SessionEnd`] and nothing is shared with other
//! sessions.

use std::{fmt, net::SocketAddr, time::Duration};

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf},
    sync::mpsc,
    time::timeout,
};

use super::{
    errors::{ProtocolError, SessionError},
    messages::{ClientMessage, ServerMessage},
    utils::{read_line_async, write_line_async},
};
use crate::game::{Action, Outcome, Phase, Round, RoundError, Tally};

/// How long a session waits on a silent client before dropping it.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Largest round count a client may request.
pub const MAX_ROUNDS: u32 = 255;

/// Identifier the supervisor hands out to each accepted connection.
pub type SessionId = u64;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Limit on each read and write.
    pub idle_timeout: Duration,
    pub max_rounds: u32,
    /// Base seed for reproducible decks. Each session mixes in its id.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: SESSION_TIMEOUT,
            max_rounds: MAX_ROUNDS,
            seed: None,
        }
    }
}

impl SessionConfig {
    fn rng(&self, id: SessionId) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id)),
            None => StdRng::from_os_rng(),
        }
    }
}

/// How a session ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEnd {
    /// Every requested round was played and the summary was sent.
    Completed(Tally),
    /// The client sent something it shouldn't have.
    ProtocolViolation(String),
    /// The client went away or stopped responding.
    Disconnected(String),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(tally) => write!(f, "completed ({tally})"),
            Self::ProtocolViolation(reason) => write!(f, "protocol violation: {reason}"),
            Self::Disconnected(reason) => write!(f, "disconnected: {reason}"),
        }
    }
}

/// Lifecycle notifications for whoever is watching the supervisor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    Started {
        id: SessionId,
        peer: SocketAddr,
    },
    Requested {
        id: SessionId,
        rounds: u32,
    },
    RoundSettled {
        id: SessionId,
        round: u32,
        outcome: Outcome,
    },
    Finished {
        id: SessionId,
        end: SessionEnd,
    },
}

pub struct Session<S> {
    id: SessionId,
    peer: SocketAddr,
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    config: SessionConfig,
    rng: StdRng,
    tally: Tally,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl<S: AsyncRead + AsyncWrite> Session<S> {
    pub fn new(id: SessionId, peer: SocketAddr, stream: S, config: SessionConfig) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let rng = config.rng(id);
        Self {
            id,
            peer,
            reader: BufReader::new(reader),
            writer,
            config,
            rng,
            tally: Tally::default(),
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // Nobody listening is fine.
            let _ = events.send(event);
        }
    }

    /// Play the session to the end and close the connection.
    pub async fn run(mut self) -> SessionEnd {
        info!("session {} started with {}", self.id, self.peer);
        self.emit(SessionEvent::Started {
            id: self.id,
            peer: self.peer,
        });

        let end = match self.play().await {
            Ok(tally) => SessionEnd::Completed(tally),
            Err(SessionError::ProtocolViolation(error)) => {
                warn!("session {} ({}): protocol violation: {error}", self.id, self.peer);
                let reason = SessionError::ProtocolViolation(error).to_string();
                // Best effort, the client may already be gone.
                let _ = self.send(&ServerMessage::Error(reason.clone())).await;
                SessionEnd::ProtocolViolation(reason)
            }
            Err(error) => {
                debug!("session {} ({}): {error}", self.id, self.peer);
                SessionEnd::Disconnected(error.to_string())
            }
        };
        let _ = self.writer.shutdown().await;

        info!("session {} with {} {end}", self.id, self.peer);
        self.emit(SessionEvent::Finished {
            id: self.id,
            end: end.clone(),
        });
        end
    }

    async fn play(&mut self) -> Result<Tally, SessionError> {
        let rounds = self.recv_round_count().await?;
        self.emit(SessionEvent::Requested {
            id: self.id,
            rounds,
        });
        for round in 1..=rounds {
            let outcome = self.play_round(round, rounds).await?;
            self.tally.record(outcome);
            self.emit(SessionEvent::RoundSettled {
                id: self.id,
                round,
                outcome,
            });
        }
        self.send(&ServerMessage::summary(&self.tally)).await?;
        Ok(self.tally.clone())
    }

    async fn play_round(&mut self, number: u32, of: u32) -> Result<Outcome, SessionError> {
        let mut round = Round::shuffled(&mut self.rng);
        round.deal()?;
        let up_card = round.up_card().ok_or(RoundError::DeckExhausted)?;
        self.send(&ServerMessage::Deal {
            player: round.player().clone(),
            up_card,
        })
        .await?;

        while round.phase() == Phase::PlayerTurn {
            self.send(&ServerMessage::ActionPrompt).await?;
            let action = self.recv_action().await?;
            if let Some(card) = round.act(action)? {
                self.send(&ServerMessage::Card(card)).await?;
            }
        }
        if round.phase() == Phase::DealerTurn {
            round.play_dealer()?;
        }
        let outcome = round.settle()?;
        debug!(
            "session {} round {number}/{of}: {outcome:?} player {} dealer {}",
            self.id,
            round.player(),
            round.dealer()
        );
        self.send(&ServerMessage::Result {
            outcome,
            player: round.player().clone(),
            dealer: round.dealer().clone(),
        })
        .await?;
        Ok(outcome)
    }

    async fn send(&mut self, msg: &ServerMessage) -> Result<(), SessionError> {
        let limit = self.config.idle_timeout;
        timeout(limit, write_line_async(&mut self.writer, msg))
            .await
            .map_err(|_| SessionError::Timeout(limit))??;
        Ok(())
    }

    async fn recv(&mut self) -> Result<ClientMessage, SessionError> {
        let limit = self.config.idle_timeout;
        let line = timeout(limit, read_line_async(&mut self.reader))
            .await
            .map_err(|_| SessionError::Timeout(limit))?;
        match line {
            Ok(Some(line)) => Ok(line.parse::<ClientMessage>()?),
            Ok(None) => Err(SessionError::Disconnect),
            Err(error) => match error.kind() {
                std::io::ErrorKind::InvalidData => {
                    Err(ProtocolError::Framing(error.to_string()).into())
                }
                std::io::ErrorKind::UnexpectedEof => Err(SessionError::Disconnect),
                _ => Err(error.into()),
            },
        }
    }

    async fn recv_round_count(&mut self) -> Result<u32, SessionError> {
        match self.recv().await? {
            ClientMessage::Rounds(n) if n <= self.config.max_rounds => Ok(n),
            ClientMessage::Rounds(n) => Err(ProtocolError::RoundCountOutOfRange {
                requested: n.into(),
                max: self.config.max_rounds,
            }
            .into()),
            other => Err(ProtocolError::Unexpected(other.to_string()).into()),
        }
    }

    async fn recv_action(&mut self) -> Result<Action, SessionError> {
        match self.recv().await? {
            ClientMessage::Action(action) => Ok(action),
            other => Err(ProtocolError::Unexpected(other.to_string()).into()),
        }
    }
}
