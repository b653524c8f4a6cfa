//! Table actor message types.

use super::store::TablePatch;
use crate::game::{errors::TableResult, state_machine::TableState};
use tokio::sync::{mpsc, oneshot};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Read the current snapshot
    Snapshot {
        response: oneshot::Sender<TableResult<TableState>>,
    },

    /// Compare-and-set commit against `expected_version`
    Commit {
        expected_version: u64,
        patch: TablePatch,
        response: oneshot::Sender<TableResult<TableState>>,
    },

    /// Register a snapshot subscriber. The current snapshot is sent to it
    /// before the reply.
    Subscribe {
        sender: mpsc::UnboundedSender<TableState>,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Stop the actor and drop every subscriber
    Close,
}
