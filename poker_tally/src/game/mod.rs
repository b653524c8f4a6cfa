//! Chip accounting and betting flow for one table.
//!
//! This module provides:
//! - Seat, player, and action entities
//! - The betting engine (turn order, bet validation, round closure)
//! - The hand lifecycle (dealer rotation, blinds, showdown, pot distribution)
//! - A pure `(state, intent) -> state'` transition function

pub mod betting;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod render;
pub mod state_machine;
pub mod states;

pub use errors::{DistributionError, InvalidActionReason, TableError, TableResult};
pub use state_machine::{Intent, TableState, Transition, transition};
pub use states::{HandPhase, PhaseRules};
