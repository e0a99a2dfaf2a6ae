use private_blackjack::{Action, net::session::MAX_ROUNDS};
use std::fmt;

/// Something the player typed at the decision prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Round count that isn't a number.
    InvalidRounds(String),
    /// Round count outside the accepted range.
    RoundsOutOfRange(u64),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRounds(value) => {
                write!(f, "'{value}' is not a number. Please enter a valid number")
            }
            Self::RoundsOutOfRange(_) => {
                write!(f, "Number of rounds must be between 1 and {MAX_ROUNDS}")
            }
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'hit', 'stand' or 'help'"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a command string into a [`Command`].
///
/// Commands are case-insensitive and may be abbreviated to their first
/// letter.
///
/// # Examples
///
/// ```
/// use pb_client::commands::{Command, parse_command};
/// use private_blackjack::Action;
///
/// assert_eq!(parse_command("Hit"), Ok(Command::Act(Action::Hit)));
/// assert_eq!(parse_command("s"), Ok(Command::Act(Action::Stand)));
/// assert!(parse_command("double").is_err());
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "h" | "hit" => Ok(Command::Act(Action::Hit)),
        "s" | "stand" => Ok(Command::Act(Action::Stand)),
        "?" | "help" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse a requested round count, accepting 1 through 255.
///
/// # Examples
///
/// ```
/// use pb_client::commands::parse_rounds;
///
/// assert_eq!(parse_rounds(" 3 "), Ok(3));
/// assert!(parse_rounds("0").is_err());
/// assert!(parse_rounds("many").is_err());
/// ```
pub fn parse_rounds(input: &str) -> Result<u32, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidRounds(trimmed.to_string()));
    }
    // All digits, so the only possible failure is overflow.
    let rounds = trimmed.parse::<u64>().unwrap_or(u64::MAX);
    match u32::try_from(rounds) {
        Ok(rounds) if (1..=MAX_ROUNDS).contains(&rounds) => Ok(rounds),
        _ => Err(ParseError::RoundsOutOfRange(rounds)),
    }
}
