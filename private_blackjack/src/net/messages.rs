//! Session messages exchanged over the reliable stream.
//!
//! Each message is a single line of ASCII text. Parsing is strict: anything
//! that isn't exactly one of the variants below is a [`ProtocolError`].

use std::{fmt, str::FromStr};

use super::errors::ProtocolError;
use crate::game::{Action, Card, Hand, Outcome, Tally};

/// Placeholder shown for the dealer's face-down card.
pub const HIDDEN_CARD: &str = "??";

/// A message from a client to the dealer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientMessage {
    /// How many rounds to play. Only valid as the first message.
    Rounds(u32),
    /// A decision in response to [`ServerMessage::ActionPrompt`].
    Action(Action),
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Rounds(n) => write!(f, "{n}"),
            Self::Action(Action::Hit) => write!(f, "HIT"),
            Self::Action(Action::Stand) => write!(f, "STAND"),
        }
    }
}

impl FromStr for ClientMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
            return match s.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Self::Rounds(n)),
                _ => Err(ProtocolError::InvalidRoundCount(s.to_string())),
            };
        }
        match s.to_ascii_uppercase().as_str() {
            "HIT" => Ok(Self::Action(Action::Hit)),
            "STAND" => Ok(Self::Action(Action::Stand)),
            _ => Err(ProtocolError::UnknownMessage(s.to_string())),
        }
    }
}

/// A message from the dealer to a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServerMessage {
    /// Opening cards of a round. Only the dealer's up card is shown.
    Deal { player: Hand, up_card: Card },
    /// A card the player drew after hitting.
    Card(Card),
    /// The dealer is waiting for a [`ClientMessage::Action`].
    ActionPrompt,
    /// End of a round with both final hands.
    Result {
        outcome: Outcome,
        player: Hand,
        dealer: Hand,
    },
    /// End of the session. The connection closes afterwards.
    Summary { wins: u32, losses: u32, pushes: u32 },
    /// The session is being torn down because of a client error.
    Error(String),
}

impl ServerMessage {
    #[must_use]
    pub fn summary(tally: &Tally) -> Self {
        Self::Summary {
            wins: tally.total_wins(),
            losses: tally.total_losses(),
            pushes: tally.pushes,
        }
    }
}

fn outcome_token(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Win => "WIN",
        Outcome::Lose => "LOSE",
        Outcome::Push => "PUSH",
        Outcome::PlayerBlackjack => "BLACKJACK",
        Outcome::PlayerBust => "BUST",
        Outcome::DealerBust => "DEALER_BUST",
    }
}

fn parse_outcome(s: &str) -> Result<Outcome, ProtocolError> {
    Outcome::ALL
        .into_iter()
        .find(|o| outcome_token(*o) == s)
        .ok_or_else(|| ProtocolError::UnknownOutcome(s.to_string()))
}

/// Strip `KEY=` from the next token.
fn field<'a>(token: Option<&'a str>, key: &'static str) -> Result<&'a str, ProtocolError> {
    token
        .and_then(|t| t.strip_prefix(key))
        .and_then(|t| t.strip_prefix('='))
        .ok_or(ProtocolError::MissingField(key))
}

fn parse_cards(s: &str) -> Result<Vec<&str>, ProtocolError> {
    let inner = s
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ProtocolError::Framing(format!("expected [cards], got {s:?}")))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(',').collect())
}

fn parse_hand(s: &str) -> Result<Hand, ProtocolError> {
    let cards = parse_cards(s)?
        .into_iter()
        .map(str::parse)
        .collect::<Result<Vec<Card>, _>>()?;
    Ok(Hand::from(cards))
}

fn parse_count(token: Option<&str>, key: &'static str) -> Result<u32, ProtocolError> {
    let value = field(token, key)?;
    value
        .parse()
        .map_err(|_| ProtocolError::Framing(format!("{key} is not a count: {value:?}")))
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Deal { player, up_card } => {
                write!(f, "DEAL PLAYER={player} DEALER=[{up_card},{HIDDEN_CARD}]")
            }
            Self::Card(card) => write!(f, "CARD {card}"),
            Self::ActionPrompt => write!(f, "ACTION?"),
            Self::Result {
                outcome,
                player,
                dealer,
            } => write!(
                f,
                "RESULT {} PLAYER={player} DEALER={dealer}",
                outcome_token(*outcome)
            ),
            Self::Summary {
                wins,
                losses,
                pushes,
            } => write!(f, "SUMMARY WINS={wins} LOSSES={losses} PUSHES={pushes}"),
            Self::Error(reason) => write!(f, "ERROR {reason}"),
        }
    }
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (tag, rest) = s.split_once(' ').unwrap_or((s, ""));
        let mut tokens = rest.split_whitespace();
        let msg = match tag {
            "" => return Err(ProtocolError::Empty),
            "ACTION?" => Self::ActionPrompt,
            "CARD" => Self::Card(tokens.next().ok_or(ProtocolError::MissingField("CARD"))?.parse()?),
            "DEAL" => {
                let player = parse_hand(field(tokens.next(), "PLAYER")?)?;
                let dealer = parse_cards(field(tokens.next(), "DEALER")?)?;
                let up_card = match dealer.as_slice() {
                    [up, hidden] if *hidden == HIDDEN_CARD => up.parse()?,
                    _ => {
                        return Err(ProtocolError::Framing(format!(
                            "dealer should show one card and one {HIDDEN_CARD}"
                        )));
                    }
                };
                Self::Deal { player, up_card }
            }
            "RESULT" => {
                let outcome = parse_outcome(tokens.next().ok_or(ProtocolError::MissingField("OUTCOME"))?)?;
                let player = parse_hand(field(tokens.next(), "PLAYER")?)?;
                let dealer = parse_hand(field(tokens.next(), "DEALER")?)?;
                Self::Result {
                    outcome,
                    player,
                    dealer,
                }
            }
            "SUMMARY" => Self::Summary {
                wins: parse_count(tokens.next(), "WINS")?,
                losses: parse_count(tokens.next(), "LOSSES")?,
                pushes: parse_count(tokens.next(), "PUSHES")?,
            },
            "ERROR" => return Ok(Self::Error(rest.to_string())),
            _ => return Err(ProtocolError::UnknownMessage(s.to_string())),
        };
        match tokens.next() {
            Some(extra) => Err(ProtocolError::Framing(format!("trailing {extra:?}"))),
            None => Ok(msg),
        }
    }
}
