//! Automatic players.
//!
//! A bot is a [`Strategy`] plus the blocking [`Client`](crate::Client) loop in
//! [`play_session`]. Three strategies are provided:
//!
//! - [`DealerMimic`]: hits below 17 and on soft 17, exactly like the dealer
//! - [`BasicStrategy`]: stands on stiff hands against a weak dealer up card
//! - [`RandomStrategy`]: a seeded coin flip, useful for load and fuzzing
//!
//! ## Example
//!
//! ```no_run
//! use private_blackjack::{
//!     Client,
//!     bot::{BasicStrategy, play_session},
//! };
//!
//! let addr = "127.0.0.1:4000".parse().unwrap();
//! let mut client = Client::connect(&addr).unwrap();
//! let report = play_session(&mut client, 10, &mut BasicStrategy).unwrap();
//! println!("{}", report.tally);
//! ```

pub mod decision;
pub mod player;

pub use decision::{
    BasicStrategy, DealerMimic, RandomStrategy, Strategy, StrategyKind, UnknownStrategy,
};
pub use player::{SessionReport, play_session};
