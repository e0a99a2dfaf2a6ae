//! Blackjack round state machine.
//!
//! A [`Round`] moves through `Dealing → PlayerTurn → DealerTurn → Settlement
//! → Done`. Each transition is a method that checks the current phase, so a
//! driver that calls things out of order gets a [`RoundError`] instead of a
//! corrupted round. A round owns its deck and both hands; nothing carries
//! over to the next round.

use log::debug;
use rand::Rng;
use std::{cmp::Ordering, fmt};
use thiserror::Error;

use super::entities::{Action, BLACKJACK, Card, DEALER_STAND, Deck, Hand, HandValue, Outcome};

/// Phases of a single round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Dealing,
    PlayerTurn,
    DealerTurn,
    Settlement,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Dealing => "dealing",
            Self::PlayerTurn => "player turn",
            Self::DealerTurn => "dealer turn",
            Self::Settlement => "settlement",
            Self::Done => "done",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum RoundError {
    #[error("can't do that during {actual} (expected {expected})")]
    WrongPhase { expected: Phase, actual: Phase },
    #[error("deck exhausted")]
    DeckExhausted,
}

/// Dealer policy: draw below 17 and on soft 17, stand on everything else.
#[must_use]
pub fn dealer_should_hit(value: HandValue) -> bool {
    value.total < DEALER_STAND || (value.total == DEALER_STAND && value.soft)
}

#[derive(Debug)]
pub struct Round {
    deck: Deck,
    player: Hand,
    dealer: Hand,
    phase: Phase,
    outcome: Option<Outcome>,
}

impl Round {
    /// A round that will be dealt from `deck`.
    #[must_use]
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            phase: Phase::Dealing,
            outcome: None,
        }
    }

    /// A round dealt from a freshly shuffled deck.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(Deck::shuffled(rng))
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn player(&self) -> &Hand {
        &self.player
    }

    #[must_use]
    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    /// The dealer's face-up card, once dealt.
    #[must_use]
    pub fn up_card(&self) -> Option<Card> {
        self.dealer.cards().first().copied()
    }

    /// Set once the round reaches settlement.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn expect(&self, expected: Phase) -> Result<(), RoundError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RoundError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn draw(&mut self) -> Result<Card, RoundError> {
        self.deck.draw().ok_or(RoundError::DeckExhausted)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.phase = Phase::Settlement;
    }

    /// Deal two cards each, player first. A player natural ends the round
    /// immediately as a blackjack, or a push if the dealer has one too.
    pub fn deal(&mut self) -> Result<Phase, RoundError> {
        self.expect(Phase::Dealing)?;
        for _ in 0..2 {
            let card = self.draw()?;
            self.player.push(card);
        }
        for _ in 0..2 {
            let card = self.draw()?;
            self.dealer.push(card);
        }
        debug!("dealt player {} dealer {}", self.player, self.dealer);

        if self.player.value().total == BLACKJACK {
            if self.dealer.value().total == BLACKJACK {
                self.finish(Outcome::Push);
            } else {
                self.finish(Outcome::PlayerBlackjack);
            }
        } else {
            self.phase = Phase::PlayerTurn;
        }
        Ok(self.phase)
    }

    /// Draw one card for the player. Busting settles the round.
    pub fn hit(&mut self) -> Result<Card, RoundError> {
        self.expect(Phase::PlayerTurn)?;
        let card = self.draw()?;
        self.player.push(card);
        if self.player.value().is_bust() {
            self.finish(Outcome::PlayerBust);
        }
        Ok(card)
    }

    pub fn stand(&mut self) -> Result<(), RoundError> {
        self.expect(Phase::PlayerTurn)?;
        self.phase = Phase::DealerTurn;
        Ok(())
    }

    /// Apply a player decision, returning the card drawn on a hit.
    pub fn act(&mut self, action: Action) -> Result<Option<Card>, RoundError> {
        match action {
            Action::Hit => self.hit().map(Some),
            Action::Stand => self.stand().map(|()| None),
        }
    }

    /// Reveal the hole card and draw by the house rule. Returns the cards
    /// drawn after the reveal.
    pub fn play_dealer(&mut self) -> Result<Vec<Card>, RoundError> {
        self.expect(Phase::DealerTurn)?;
        let mut drawn = Vec::new();
        while dealer_should_hit(self.dealer.value()) {
            let card = self.draw()?;
            self.dealer.push(card);
            drawn.push(card);
        }
        if self.dealer.value().is_bust() {
            self.finish(Outcome::DealerBust);
        } else {
            self.phase = Phase::Settlement;
        }
        Ok(drawn)
    }

    /// Compare hands if nobody busted and close the round.
    pub fn settle(&mut self) -> Result<Outcome, RoundError> {
        self.expect(Phase::Settlement)?;
        let outcome = match self.outcome {
            Some(outcome) => outcome,
            None => {
                let player = self.player.value().total;
                let dealer = self.dealer.value().total;
                match player.cmp(&dealer) {
                    Ordering::Greater => Outcome::Win,
                    Ordering::Less => Outcome::Lose,
                    Ordering::Equal => Outcome::Push,
                }
            }
        };
        self.outcome = Some(outcome);
        self.phase = Phase::Done;
        Ok(outcome)
    }

    /// Run the round to completion with a fixed decision function. Mostly
    /// useful for simulations and tests.
    pub fn play_with<F>(mut self, mut decide: F) -> Result<(Outcome, Self), RoundError>
    where
        F: FnMut(&Hand, Card) -> Action,
    {
        if self.deal()? == Phase::PlayerTurn {
            let up_card = self.up_card().ok_or(RoundError::DeckExhausted)?;
            while self.phase == Phase::PlayerTurn {
                self.act(decide(&self.player, up_card))?;
            }
        }
        if self.phase == Phase::DealerTurn {
            self.play_dealer()?;
        }
        let outcome = self.settle()?;
        Ok((outcome, self))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::game::entities::value;

    fn cards(tokens: &[&str]) -> Vec<Card> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    /// Deck order is player, player, dealer up, dealer hole, then draws.
    fn round(tokens: &[&str]) -> Round {
        Round::new(Deck::stacked(cards(tokens)))
    }

    #[test]
    fn dealer_hits_soft_17() {
        assert!(dealer_should_hit(value(&cards(&["AS", "6H"]))));
    }

    #[test]
    fn dealer_stands_on_hard_17() {
        assert!(!dealer_should_hit(value(&cards(&["10S", "7H"]))));
        assert!(!dealer_should_hit(value(&cards(&["AS", "6H", "KD"]))));
    }

    #[test]
    fn dealer_draws_on_soft_17_in_round() {
        let mut round = round(&["10C", "8C", "AS", "6H", "2D"]);
        assert_eq!(round.deal(), Ok(Phase::PlayerTurn));
        round.stand().unwrap();
        let drawn = round.play_dealer().unwrap();
        assert_eq!(drawn, cards(&["2D"]));
        assert_eq!(round.dealer().value().total, 19);
        assert_eq!(round.settle(), Ok(Outcome::Lose));
    }

    #[test]
    fn dealer_stops_on_hard_17_in_round() {
        let mut round = round(&["10C", "9C", "10S", "7H", "2D"]);
        round.deal().unwrap();
        round.stand().unwrap();
        assert!(round.play_dealer().unwrap().is_empty());
        assert_eq!(round.settle(), Ok(Outcome::Win));
    }

    #[test]
    fn player_natural_is_blackjack() {
        let mut round = round(&["AS", "KH", "9C", "7D"]);
        assert_eq!(round.deal(), Ok(Phase::Settlement));
        assert_eq!(round.settle(), Ok(Outcome::PlayerBlackjack));
        assert_eq!(round.phase(), Phase::Done);
    }

    #[test]
    fn both_naturals_push() {
        let mut round = round(&["AS", "KH", "AC", "QD"]);
        round.deal().unwrap();
        assert_eq!(round.settle(), Ok(Outcome::Push));
    }

    #[test]
    fn player_bust_skips_dealer() {
        let mut round = round(&["10C", "6C", "9S", "7H", "KD"]);
        round.deal().unwrap();
        assert_eq!(round.hit(), Ok("KD".parse().unwrap()));
        assert_eq!(round.phase(), Phase::Settlement);
        assert!(matches!(
            round.play_dealer(),
            Err(RoundError::WrongPhase { .. })
        ));
        assert_eq!(round.settle(), Ok(Outcome::PlayerBust));
        assert_eq!(round.dealer().len(), 2);
    }

    #[test]
    fn dealer_bust() {
        let mut round = round(&["10C", "8C", "10S", "6H", "KD"]);
        round.deal().unwrap();
        round.stand().unwrap();
        round.play_dealer().unwrap();
        assert_eq!(round.outcome(), Some(Outcome::DealerBust));
        assert_eq!(round.settle(), Ok(Outcome::DealerBust));
    }

    #[test]
    fn equal_totals_push() {
        let mut round = round(&["10C", "8C", "10S", "8H"]);
        round.deal().unwrap();
        round.stand().unwrap();
        round.play_dealer().unwrap();
        assert_eq!(round.settle(), Ok(Outcome::Push));
    }

    #[test]
    fn hit_then_stand() {
        let mut round = round(&["2C", "3C", "10S", "7H", "4D"]);
        round.deal().unwrap();
        assert_eq!(round.act(Action::Hit), Ok(Some("4D".parse().unwrap())));
        assert_eq!(round.act(Action::Stand), Ok(None));
        assert_eq!(round.phase(), Phase::DealerTurn);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let mut round = round(&["2C", "3C", "10S", "7H"]);
        assert_eq!(
            round.hit(),
            Err(RoundError::WrongPhase {
                expected: Phase::PlayerTurn,
                actual: Phase::Dealing
            })
        );
        assert!(round.settle().is_err());
        round.deal().unwrap();
        assert!(round.deal().is_err());
    }

    #[test]
    fn exhausted_deck_is_an_error() {
        let mut round = round(&["2C", "3C", "10S"]);
        assert_eq!(round.deal(), Err(RoundError::DeckExhausted));
    }

    #[test]
    fn up_card_is_first_dealer_card() {
        let mut round = round(&["2C", "3C", "10S", "7H"]);
        assert_eq!(round.up_card(), None);
        round.deal().unwrap();
        assert_eq!(round.up_card(), Some("10S".parse().unwrap()));
    }

    #[test]
    fn seeded_rounds_replay_identically() {
        let play = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            Round::shuffled(&mut rng)
                .play_with(|hand, _| {
                    if hand.value().total < 17 {
                        Action::Hit
                    } else {
                        Action::Stand
                    }
                })
                .unwrap()
        };
        let (a, round_a) = play(99);
        let (b, round_b) = play(99);
        assert_eq!(a, b);
        assert_eq!(round_a.player(), round_b.player());
        assert_eq!(round_a.dealer(), round_b.dealer());
    }

    #[test]
    fn successive_rounds_use_fresh_decks() {
        let mut rng = StdRng::seed_from_u64(3);
        let first = Round::shuffled(&mut rng);
        let second = Round::shuffled(&mut rng);
        assert_eq!(first.deck.len(), 52);
        assert_eq!(second.deck.len(), 52);
        assert!(!first.deck.remaining().eq(second.deck.remaining()));
    }
}
