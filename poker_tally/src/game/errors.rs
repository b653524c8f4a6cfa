use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, SeatIndex};

/// Why a betting or lifecycle intent was refused.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum InvalidActionReason {
    #[error("not your turn")]
    OutOfTurn,
    #[error("no hand in progress")]
    NoActiveHand,
    #[error("player can't act (folded, busted, or all-in)")]
    CannotAct,
    #[error("can't check facing ${to_call}")]
    CannotCheck { to_call: Chips },
    #[error("nothing to call")]
    NothingToCall,
    #[error("raise must be at least ${min}")]
    RaiseTooSmall { min: Chips },
    #[error("only ${chips} left in the stack")]
    InsufficientChips { chips: Chips },
    #[error("waiting for winners to be picked")]
    ShowdownPending,
    #[error("hand already in progress")]
    HandInProgress,
    #[error("no seat {0}")]
    InvalidSeat(SeatIndex),
    #[error("no showdown to settle")]
    NoShowdownPending,
}

/// Why a pot split was refused.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum DistributionError {
    #[error("pick at least one winner")]
    NoWinners,
    #[error("seat {0} is listed twice")]
    DuplicateSeat(SeatIndex),
    #[error("seat {0} can't win this pot")]
    IneligibleSeat(SeatIndex),
    #[error("awards total ${total} but the pot is ${pot}")]
    ExceedsPot { total: u64, pot: Chips },
}

/// Errors that can occur while operating on a table.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum TableError {
    #[error("invalid action: {0}")]
    InvalidAction(#[from] InvalidActionReason),

    #[error("invalid distribution: {0}")]
    InvalidDistribution(#[from] DistributionError),

    #[error("seat {seat} still has ${chips}")]
    AlreadyFunded { seat: SeatIndex, chips: Chips },

    /// Everything bought in at one table must fit in a single stack.
    #[error("table can't hold more than ${max} in chips")]
    ChipLimit { max: Chips },

    #[error("need 2+ players with chips, have {funded}")]
    InsufficientPlayers { funded: usize },

    #[error("stale state: expected version {expected}, table is at {actual}")]
    StaleState { expected: u64, actual: u64 },

    #[error("table expired")]
    TableExpired,

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid table config: {0}")]
    InvalidConfig(String),

    #[error("table store is closed")]
    StoreClosed,
}

impl TableError {
    /// Text safe to put in front of a player.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidAction(reason) => reason.to_string(),
            Self::InvalidDistribution(reason) => reason.to_string(),
            Self::AlreadyFunded { .. } => "That player still has chips".to_string(),
            Self::ChipLimit { .. } => "The table can't hold any more chips".to_string(),
            Self::InsufficientPlayers { .. } => "Need at least 2 players with chips".to_string(),
            Self::StaleState { .. } => "The table changed, try again".to_string(),
            Self::TableExpired => "This table has expired".to_string(),
            Self::TableNotFound(_) => "Table not found".to_string(),
            Self::InvalidConfig(reason) => reason.clone(),
            Self::StoreClosed => "Lost connection to the table".to_string(),
        }
    }

    /// Whether the session that hit this error can never succeed again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::TableExpired | Self::TableNotFound(_) | Self::StoreClosed
        )
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
