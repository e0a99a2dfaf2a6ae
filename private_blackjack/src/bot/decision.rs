//! Hit/stand decision-making for bots.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::game::{Action, BLACKJACK, Card, Hand, dealer_should_hit};

/// Hard totals at or above this always stand under basic strategy.
const BASIC_HARD_STAND: u8 = 17;

/// Hard totals from here up to [`BASIC_HARD_STAND`] stand against a weak
/// dealer up card.
const BASIC_STIFF_FLOOR: u8 = 12;

/// Soft totals at or above this stand under basic strategy.
const BASIC_SOFT_STAND: u8 = 18;

/// Default chance a [`RandomStrategy`] hits.
pub const DEFAULT_HIT_PROBABILITY: f64 = 0.5;

/// Decides whether to hit or stand given the player's hand and the dealer's
/// visible card.
pub trait Strategy {
    fn decide(&mut self, player: &Hand, up_card: Card) -> Action;

    fn name(&self) -> &'static str;
}

/// Plays exactly like the dealer: hit below 17 and on soft 17.
#[derive(Clone, Copy, Debug, Default)]
pub struct DealerMimic;

impl Strategy for DealerMimic {
    fn decide(&mut self, player: &Hand, _up_card: Card) -> Action {
        if dealer_should_hit(player.value()) {
            Action::Hit
        } else {
            Action::Stand
        }
    }

    fn name(&self) -> &'static str {
        "dealer"
    }
}

/// Simplified hit/stand basic strategy.
///
/// Hard 17+ stands. Hard 12 to 16 stands when the dealer shows 2 through 6
/// and hits otherwise. Soft 17 and below hits, soft 18+ stands.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicStrategy;

impl Strategy for BasicStrategy {
    fn decide(&mut self, player: &Hand, up_card: Card) -> Action {
        let value = player.value();
        let stand = if value.soft {
            value.total >= BASIC_SOFT_STAND
        } else if value.total >= BASIC_HARD_STAND {
            true
        } else if value.total >= BASIC_STIFF_FLOOR {
            // Ace counts as 1 here, so it is never a weak up card.
            (2..=6).contains(&up_card.rank().points())
        } else {
            false
        };
        if stand { Action::Stand } else { Action::Hit }
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

/// Flips a weighted coin on every decision, except that it never hits 21.
#[derive(Debug)]
pub struct RandomStrategy {
    rng: StdRng,
    hit_probability: f64,
}

impl RandomStrategy {
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            hit_probability: DEFAULT_HIT_PROBABILITY,
        }
    }

    /// Clamped to `0.0..=1.0`. NaN falls back to the default.
    #[must_use]
    pub fn with_hit_probability(mut self, hit_probability: f64) -> Self {
        self.hit_probability = if hit_probability.is_nan() {
            DEFAULT_HIT_PROBABILITY
        } else {
            hit_probability.clamp(0.0, 1.0)
        };
        self
    }
}

impl Strategy for RandomStrategy {
    fn decide(&mut self, player: &Hand, _up_card: Card) -> Action {
        if player.value().total >= BLACKJACK {
            return Action::Stand;
        }
        if self.rng.random_bool(self.hit_probability) {
            Action::Hit
        } else {
            Action::Stand
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
#[error("unknown strategy {0:?} (expected dealer, basic or random)")]
pub struct UnknownStrategy(pub String);

/// Strategy selector used by command-line front ends.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StrategyKind {
    #[default]
    Dealer,
    Basic,
    Random,
}

impl StrategyKind {
    /// Build a boxed strategy. `seed` only matters for [`StrategyKind::Random`].
    #[must_use]
    pub fn build(self, seed: Option<u64>) -> Box<dyn Strategy + Send> {
        match self {
            Self::Dealer => Box::new(DealerMimic),
            Self::Basic => Box::new(BasicStrategy),
            Self::Random => Box::new(RandomStrategy::new(seed)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Dealer => "dealer",
            Self::Basic => "basic",
            Self::Random => "random",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dealer" => Ok(Self::Dealer),
            "basic" => Ok(Self::Basic),
            "random" => Ok(Self::Random),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}
