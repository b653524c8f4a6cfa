//! Hand phase definitions.
//!
//! A table is always in exactly one phase. The phase decides which intents
//! are even worth validating; the transition code does the rest.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::InvalidActionReason;
use super::state_machine::Intent;

#[enum_dispatch]
pub trait PhaseRules {
    /// Whether betting is under way.
    fn hand_active(&self) -> bool;

    /// Reject intents that make no sense in this phase.
    fn admits(&self, intent: &Intent) -> Result<(), InvalidActionReason>;
}

/// Between hands. Buy-ins happen here.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NotStarted;

/// Blinds are in and players are acting.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Betting;

/// Betting is over and somebody has to pick the winners.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShowdownPending;

impl PhaseRules for NotStarted {
    fn hand_active(&self) -> bool {
        false
    }

    fn admits(&self, intent: &Intent) -> Result<(), InvalidActionReason> {
        match intent {
            Intent::StartHand { .. } | Intent::BuyIn { .. } => Ok(()),
            Intent::Act { .. } => Err(InvalidActionReason::NoActiveHand),
            Intent::DistributePot { .. } => Err(InvalidActionReason::NoShowdownPending),
        }
    }
}

impl PhaseRules for Betting {
    fn hand_active(&self) -> bool {
        true
    }

    fn admits(&self, intent: &Intent) -> Result<(), InvalidActionReason> {
        match intent {
            Intent::Act { .. } => Ok(()),
            Intent::StartHand { .. } | Intent::BuyIn { .. } => {
                Err(InvalidActionReason::HandInProgress)
            }
            Intent::DistributePot { .. } => Err(InvalidActionReason::NoShowdownPending),
        }
    }
}

impl PhaseRules for ShowdownPending {
    fn hand_active(&self) -> bool {
        false
    }

    fn admits(&self, intent: &Intent) -> Result<(), InvalidActionReason> {
        match intent {
            Intent::DistributePot { .. } => Ok(()),
            _ => Err(InvalidActionReason::ShowdownPending),
        }
    }
}

#[enum_dispatch(PhaseRules)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HandPhase {
    NotStarted,
    Betting,
    ShowdownPending,
}

impl Default for HandPhase {
    fn default() -> Self {
        NotStarted.into()
    }
}

impl HandPhase {
    pub fn is_showdown_pending(&self) -> bool {
        matches!(self, Self::ShowdownPending(_))
    }
}

impl fmt::Display for HandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::NotStarted(_) => "waiting for the next hand",
            Self::Betting(_) => "betting",
            Self::ShowdownPending(_) => "showdown",
        };
        write!(f, "{repr}")
    }
}
