use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Highest total a hand may reach without busting.
pub const BLACKJACK: u8 = 21;

/// The dealer draws below this total (and on a soft total equal to it).
pub const DEALER_STAND: u8 = 17;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];

    fn symbol(self) -> char {
        match self {
            Self::Club => 'C',
            Self::Diamond => 'D',
            Self::Heart => 'H',
            Self::Spade => 'S',
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card rank. Aces are valued 1 here; whether they count as 11 is decided
/// when valuing a whole [`Hand`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Hard value of the rank (ace = 1, faces = 10).
    #[must_use]
    pub const fn points(self) -> u8 {
        match self {
            Self::Ace => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Self::Ace => "A",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
        }
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
#[error("invalid card {0:?}")]
pub struct InvalidCard(pub String);

/// A playing card. Formats as its wire token, e.g. `AS`, `10H`, `KD`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Rank, pub Suit);

impl Card {
    #[must_use]
    pub const fn rank(self) -> Rank {
        self.0
    }

    #[must_use]
    pub const fn suit(self) -> Suit {
        self.1
    }

    /// Human readable form used by the console client, e.g. `10/♥`.
    #[must_use]
    pub fn pretty(self) -> String {
        format!("{}/{}", self.0.token(), self.1)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.0.token(), self.1.symbol())
    }
}

impl FromStr for Card {
    type Err = InvalidCard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCard(s.to_string());
        let mut chars = s.chars();
        let suit = match chars.next_back().ok_or_else(invalid)? {
            'C' => Suit::Club,
            'D' => Suit::Diamond,
            'H' => Suit::Heart,
            'S' => Suit::Spade,
            _ => return Err(invalid()),
        };
        let rank = Rank::ALL
            .into_iter()
            .find(|rank| rank.token() == chars.as_str())
            .ok_or_else(invalid)?;
        Ok(Self(rank, suit))
    }
}

/// A single 52-card deck. Cards are drawn from the top until the deck
/// is exhausted; a deck is never refilled.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A fresh deck shuffled with the given random source.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(rng);
        deck
    }

    /// A deck that yields exactly `order`, first card first. Useful for
    /// replaying a known deal.
    pub fn stacked(order: impl IntoIterator<Item = Card>) -> Self {
        let mut cards: Vec<Card> = order.into_iter().collect();
        cards.reverse();
        Self { cards }
    }

    /// Remove and return the top card, `None` once the deck is empty.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards left in draw order.
    pub fn remaining(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().rev()
    }
}

impl Default for Deck {
    /// An unshuffled deck, suit by suit, ace to king.
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card(rank, suit));
            }
        }
        cards.reverse();
        Self { cards }
    }
}

/// Best total of a hand along with whether an ace is still counted as 11.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HandValue {
    pub total: u8,
    pub soft: bool,
}

impl HandValue {
    #[must_use]
    pub const fn is_bust(self) -> bool {
        self.total > BLACKJACK
    }
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.soft {
            write!(f, "soft {}", self.total)
        } else {
            write!(f, "{}", self.total)
        }
    }
}

/// Value a sequence of cards. Every ace starts as 11 and is recounted as 1
/// while the total is over 21.
#[must_use]
pub fn value(cards: &[Card]) -> HandValue {
    let mut total: u8 = 0;
    let mut soft_aces = 0;
    for card in cards {
        if card.rank() == Rank::Ace {
            total = total.saturating_add(11);
            soft_aces += 1;
        } else {
            total = total.saturating_add(card.rank().points());
        }
    }
    while total > BLACKJACK && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }
    HandValue {
        total,
        soft: soft_aces > 0,
    }
}

/// Cards held by one party in a round.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn value(&self) -> HandValue {
        value(&self.cards)
    }

    /// Two cards totalling 21.
    #[must_use]
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.value().total == BLACKJACK
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{card}")?;
        }
        write!(f, "]")
    }
}

/// A player decision.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Action {
    Hit,
    Stand,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
        };
        write!(f, "{repr}")
    }
}

/// How a round ended, from the player's point of view.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Outcome {
    Win,
    Lose,
    Push,
    PlayerBlackjack,
    PlayerBust,
    DealerBust,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Win,
        Outcome::Lose,
        Outcome::Push,
        Outcome::PlayerBlackjack,
        Outcome::PlayerBust,
        Outcome::DealerBust,
    ];

    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Win | Self::PlayerBlackjack | Self::DealerBust)
    }

    #[must_use]
    pub const fn is_loss(self) -> bool {
        matches!(self, Self::Lose | Self::PlayerBust)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Win => "you win",
            Self::Lose => "you lose",
            Self::Push => "push",
            Self::PlayerBlackjack => "blackjack!",
            Self::PlayerBust => "you bust",
            Self::DealerBust => "dealer busts",
        };
        write!(f, "{repr}")
    }
}

/// Running count of round outcomes within one session.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub blackjacks: u32,
    pub player_busts: u32,
    pub dealer_busts: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
            Outcome::Push => self.pushes += 1,
            Outcome::PlayerBlackjack => self.blackjacks += 1,
            Outcome::PlayerBust => self.player_busts += 1,
            Outcome::DealerBust => self.dealer_busts += 1,
        }
    }

    /// Add another tally's counts to this one.
    pub fn merge(&mut self, other: &Tally) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.pushes += other.pushes;
        self.blackjacks += other.blackjacks;
        self.player_busts += other.player_busts;
        self.dealer_busts += other.dealer_busts;
    }

    /// Every round the player came out ahead in.
    #[must_use]
    pub fn total_wins(&self) -> u32 {
        self.wins + self.blackjacks + self.dealer_busts
    }

    /// Every round the player lost, busts included.
    #[must_use]
    pub fn total_losses(&self) -> u32 {
        self.losses + self.player_busts
    }

    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.total_wins() + self.total_losses() + self.pushes
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        match self.rounds() {
            0 => 0.0,
            n => f64::from(self.total_wins()) / f64::from(n),
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} rounds, wins={}, losses={}, pushes={}, win rate={:.2}",
            self.rounds(),
            self.total_wins(),
            self.total_losses(),
            self.pushes,
            self.win_rate()
        )
    }
}
