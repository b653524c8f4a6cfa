use poker_tally::entities::{Action, Award, Chips, SeatIndex};
use std::fmt;

/// What the person at the keyboard asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a hand, optionally naming the first dealer.
    Start(Option<SeatIndex>),
    /// Betting action for whoever's turn it is.
    Act(Action),
    BuyIn(SeatIndex),
    /// Explicit pot split.
    Award(Vec<Award>),
    /// Even split between the given seats, or every eligible seat if none.
    Split(Vec<SeatIndex>),
    Show,
    Stats,
    Link,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid chip amount (not a valid number).
    InvalidAmount(String),
    /// Invalid seat number.
    InvalidSeat(String),
    /// Award entry not in SEAT:AMOUNT form.
    InvalidAward(String),
    /// Command needs an argument it didn't get.
    MissingArgument(&'static str),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount(value) => write!(
                f,
                "Invalid amount '{}'. Must be a whole number (e.g., 'raise 20')",
                value
            ),
            Self::InvalidSeat(value) => write!(f, "Invalid seat '{}'", value),
            Self::InvalidAward(value) => write!(
                f,
                "Invalid award '{}'. Use SEAT:AMOUNT (e.g., 'award 0:50 2:25')",
                value
            ),
            Self::MissingArgument(usage) => write!(f, "Usage: {}", usage),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a command line into a Command.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_command("call"), Ok(Command::Act(Action::Call)));
/// assert_eq!(parse_command("raise 20"), Ok(Command::Act(Action::Raise(20))));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed {
        "all-in" | "allin" => return Ok(Command::Act(Action::AllIn)),
        "call" => return Ok(Command::Act(Action::Call)),
        "check" => return Ok(Command::Act(Action::Check)),
        "fold" => return Ok(Command::Act(Action::Fold)),
        "show" => return Ok(Command::Show),
        "stats" => return Ok(Command::Stats),
        "link" => return Ok(Command::Link),
        "help" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.first() {
        Some(&"start") => match parts.get(1) {
            Some(seat) => Ok(Command::Start(Some(parse_seat(seat)?))),
            None => Ok(Command::Start(None)),
        },
        Some(&"raise") => {
            let value = parts
                .get(1)
                .ok_or(ParseError::MissingArgument("raise AMOUNT"))?;
            let amount = value
                .parse::<Chips>()
                .map_err(|_| ParseError::InvalidAmount(value.to_string()))?;
            Ok(Command::Act(Action::Raise(amount)))
        }
        Some(&"buyin") => {
            let seat = parts
                .get(1)
                .ok_or(ParseError::MissingArgument("buyin SEAT"))?;
            Ok(Command::BuyIn(parse_seat(seat)?))
        }
        Some(&"award") => {
            if parts.len() < 2 {
                return Err(ParseError::MissingArgument("award SEAT:AMOUNT ..."));
            }
            let awards = parts[1..]
                .iter()
                .map(|part| parse_award(part))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Command::Award(awards))
        }
        Some(&"split") => {
            let seats = parts[1..]
                .iter()
                .map(|part| parse_seat(part))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Command::Split(seats))
        }
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

fn parse_seat(value: &str) -> Result<SeatIndex, ParseError> {
    value
        .parse::<SeatIndex>()
        .map_err(|_| ParseError::InvalidSeat(value.to_string()))
}

/// Parse one "SEAT:AMOUNT" pair
fn parse_award(value: &str) -> Result<Award, ParseError> {
    let (seat, amount) = value
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidAward(value.to_string()))?;
    let seat = parse_seat(seat)?;
    let amount = amount
        .parse::<Chips>()
        .map_err(|_| ParseError::InvalidAmount(amount.to_string()))?;
    Ok(Award::new(seat, amount))
}
