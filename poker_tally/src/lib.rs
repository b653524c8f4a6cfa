//! # Poker Tally
//!
//! Chip accounting and betting flow for a shared poker table. Cards are dealt
//! with real decks at a real table; this library only tracks who owes what,
//! whose turn it is, and where the pot goes.
//!
//! ## Architecture
//!
//! A hand moves through three phases:
//!
//! - **NotStarted**: between hands; players with no chips can buy in
//! - **Betting**: blinds posted, rounds move pre-flop → flop → turn → river
//! - **ShowdownPending**: betting is over and the winners are picked by hand
//!
//! Every change is an [`Intent`] applied by a pure transition function to a
//! snapshot. The resulting patch is committed to a [`TableStore`] with
//! compare-and-set on the table version, and the store fans the committed
//! snapshot out to every subscriber.
//!
//! ## Core Modules
//!
//! - [`game`]: entities, betting engine, hand lifecycle
//! - [`table`]: store contract, in-process actor store, sessions
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use poker_tally::{Intent, TableConfig, TableState, entities::Action};
//!
//! let config = TableConfig::new(2, 100, 5, Utc::now()).unwrap();
//! let table = TableState::with_default_players(config).unwrap();
//! let table = table
//!     .apply(&Intent::StartHand { dealer: Some(0) }, Utc::now())
//!     .unwrap()
//!     .state;
//! assert_eq!(table.pot, 15);
//! assert_eq!(table.to_act, Some(0));
//!
//! let table = table
//!     .apply(&Intent::Act { seat: 0, action: Action::Fold }, Utc::now())
//!     .unwrap()
//!     .state;
//! assert_eq!(table.players[1].chips, 105);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    HandPhase, Intent, TableError, TableResult, TableState, Transition,
    constants::{self, DEFAULT_BUY_IN, DEFAULT_SMALL_BLIND, MAX_SEATS, MIN_SEATS},
    entities, functional, transition,
};

/// Table storage, actors, and sessions.
pub mod table;
pub use table::{SessionConfig, TableConfig, TableId, TableManager, TableSession, TableStore};
