//! Table storage and sessions.
//!
//! This module implements:
//! - TableStore: the contract for shared, versioned table state
//! - TableActor: Async actor owning a single table's canonical state
//! - TableManager: In-process store managing many table actors
//! - TableSession: a participant submitting intents against the store
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Commits are compare-and-set on the table version, and every accepted
//! commit is fanned out to subscribers as a full snapshot.
//!
//! ## Example
//!
//! ```no_run
//! use poker_tally::table::{SessionConfig, TableConfig, TableManager, TableSession};
//! use poker_tally::game::state_machine::TableState;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), poker_tally::TableError> {
//!     let config = TableConfig::new(4, 100, 5, chrono::Utc::now())?;
//!     let state = TableState::with_default_players(config)?;
//!     let store = Arc::new(TableManager::new());
//!     let session = TableSession::create(store, state, SessionConfig::default()).await?;
//!
//!     let mut updates = session.watch().await?;
//!     session.start_hand(Some(0)).await?;
//!     while let Some(snapshot) = updates.recv().await {
//!         println!("{snapshot}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod session;
pub mod store;

pub use actor::{TableActor, TableHandle};
pub use config::{SessionConfig, TableConfig};
pub use manager::{TableManager, TableMetadata};
pub use messages::TableMessage;
pub use session::TableSession;
pub use store::{SnapshotStream, TableId, TablePatch, TableStore};
