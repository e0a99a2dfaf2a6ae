//! Network error types for discovery and game sessions.

use std::{io, time::Duration};

use thiserror::Error;

use crate::game::{RoundError, entities::InvalidCard};

/// A discovery datagram that doesn't follow the offer layout.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum OfferError {
    #[error("malformed packet: {len} bytes is too short for an offer")]
    TooShort { len: usize },
    #[error("malformed packet: bad magic cookie {0:#010x}")]
    BadCookie(u32),
    #[error("malformed packet: unexpected message type {0:#04x}")]
    BadType(u8),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No valid offer arrived before the discovery timeout.
    #[error("no server found within {0:?}")]
    NoServerFound(Duration),
    #[error("discovery socket error: {0}")]
    Io(#[from] io::Error),
}

/// A line on the session stream that isn't a valid message.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("bad framing: {0}")]
    Framing(String),
    #[error("invalid round count {0:?}")]
    InvalidRoundCount(String),
    #[error("round count {requested} outside 1..={max}")]
    RoundCountOutOfRange { requested: u64, max: u32 },
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("unknown outcome {0:?}")]
    UnknownOutcome(String),
    #[error("unknown message {0:?}")]
    UnknownMessage(String),
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Card(#[from] InvalidCard),
    #[error("unexpected message {0:?}")]
    Unexpected(String),
}

/// Why a game session ended early.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolError),
    #[error("peer disconnected")]
    Disconnect,
    #[error("no message within {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("engine error: {0}")]
    Engine(#[from] RoundError),
}

impl SessionError {
    /// Closed sockets, failed I/O and idle timeouts all count as the peer
    /// going away.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnect | Self::Timeout(_) | Self::Io(_))
    }

    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation(_))
    }
}
