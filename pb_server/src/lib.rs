//! Blackjack dealer binary support: configuration, logging and metrics.

pub mod config;
pub mod logging;
pub mod metrics;
