//! Blackjack game engine.
//!
//! This module is transport-agnostic:
//! - Cards, decks, hands and hand valuation
//! - The per-round state machine and dealer policy
//! - Outcome bookkeeping for a session

pub mod entities;
pub mod state_machine;

pub use entities::{
    Action, BLACKJACK, Card, DEALER_STAND, DECK_SIZE, Deck, Hand, HandValue, InvalidCard, Outcome,
    Rank, Suit, Tally, value,
};
pub use state_machine::{Phase, Round, RoundError, dealer_should_hit};
