//! # Private Blackjack
//!
//! A single-player blackjack dealer for the local network.
//!
//! A dealer advertises itself by broadcasting a small UDP offer once a
//! second. A client listens for offers, connects over TCP to the first one it
//! hears, asks for a number of rounds and plays them by answering hit or
//! stand. Every connection is its own session with its own deck, tally and
//! failure handling.
//!
//! ## Rules
//!
//! - A fresh shuffled 52-card deck per round
//! - Aces count 11 unless that busts the hand, in which case they count 1
//! - The dealer hits below 17 and on soft 17
//! - A two-card 21 for the player is a blackjack and ends the round at once
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand valuation and the per-round state machine
//! - [`net`]: Discovery, the line protocol, sessions, server and client
//! - [`bot`]: Strategies and an automatic player built on the client
//!
//! ## Example
//!
//! ```
//! use private_blackjack::{Action, Round};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let (outcome, round) = Round::shuffled(&mut rng)
//!     .play_with(|_, _| Action::Stand)
//!     .unwrap();
//! assert_eq!(round.outcome(), Some(outcome));
//! ```

/// Networking components for discovery and game sessions.
pub mod net;
pub use net::{
    client::Client,
    discovery::{self, DiscoveryConfig, ServerEndpoint},
    errors::{DiscoveryError, OfferError, ProtocolError, SessionError},
    messages,
    offer::DiscoveryOffer,
    server::{self, Server, ServerConfig},
    session::{SessionConfig, SessionEnd, SessionEvent},
    utils,
};

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{Action, Card, Hand, HandValue, Outcome, Round, Tally};

/// Automatic players.
pub mod bot;
