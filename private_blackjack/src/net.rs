//! Networking layer for discovery and game sessions.
//!
//! Discovery is a fixed-layout UDP datagram. Game sessions are newline
//! delimited text over TCP. The dealer side runs on `tokio`; the client side
//! is plain blocking `std` I/O.

/// Blocking TCP client for talking to a dealer.
pub mod client;

/// UDP offer broadcasting and listening.
pub mod discovery;

pub mod errors;

/// Line protocol messages exchanged during a session.
pub mod messages;

/// Binary discovery offer codec.
pub mod offer;

/// Accept loop that spawns one session per connection.
pub mod server;

/// One client's game session on the dealer side.
pub mod session;

/// Line framing helpers.
pub mod utils;
