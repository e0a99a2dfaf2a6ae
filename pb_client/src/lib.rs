//! Internal modules for the blackjack client.
//!
//! This library provides command parsing and the console front end used by
//! the pb_client binary.

pub mod commands;
pub mod console;
