//! A participant's view of one table.
//!
//! The session never trusts its own copy of the state: every intent is
//! computed against a fresh snapshot and only counts once the store accepts
//! the commit. Losing a commit race means recomputing against the newer
//! snapshot, where an intent that's no longer legal fails on its own terms.

use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;

use super::{
    config::SessionConfig,
    store::{SnapshotStream, TableId, TablePatch, TableStore},
};
use crate::game::{
    entities::{Action, Award, SeatIndex},
    errors::{InvalidActionReason, TableError, TableResult},
    state_machine::{Intent, TableState, Transition},
};

pub struct TableSession<S: TableStore + ?Sized> {
    store: Arc<S>,
    table_id: TableId,
    config: SessionConfig,
}

impl<S: TableStore + ?Sized> Clone for TableSession<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table_id: self.table_id.clone(),
            config: self.config,
        }
    }
}

impl<S: TableStore + ?Sized> TableSession<S> {
    /// Put `initial` in the store and open a session on it.
    pub async fn create(
        store: Arc<S>,
        initial: TableState,
        config: SessionConfig,
    ) -> TableResult<Self> {
        let table_id = store.create(initial).await?;
        Ok(Self {
            store,
            table_id,
            config,
        })
    }

    /// Open a session on an existing table.
    pub async fn join(store: Arc<S>, table_id: TableId, config: SessionConfig) -> TableResult<Self> {
        store.snapshot(&table_id).await?;
        Ok(Self {
            store,
            table_id,
            config,
        })
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    /// Latest committed state.
    pub async fn snapshot(&self) -> TableResult<TableState> {
        let state = self.store.snapshot(&self.table_id).await?;
        if state.config.is_expired(Utc::now()) {
            return Err(TableError::TableExpired);
        }
        Ok(state)
    }

    /// Snapshots in commit order, starting with the current one.
    pub async fn watch(&self) -> TableResult<SnapshotStream> {
        self.store.subscribe(&self.table_id).await
    }

    /// Compute `intent` against the latest snapshot and commit it, retrying
    /// on stale state up to the configured limit. The returned state is the
    /// one the store committed.
    pub async fn submit(&self, intent: Intent) -> TableResult<Transition> {
        let mut attempt = 0;
        loop {
            let snapshot = self.snapshot().await?;
            let Transition { state, events } = snapshot.apply(&intent, Utc::now())?;
            let patch = TablePatch::diff(&snapshot, &state);

            match self
                .store
                .commit(&self.table_id, snapshot.version, patch)
                .await
            {
                Ok(committed) => {
                    debug!(
                        "Table {}: {:?} committed as version {}",
                        self.table_id, intent, committed.version
                    );
                    return Ok(Transition {
                        state: committed,
                        events,
                    });
                }
                Err(err @ TableError::StaleState { .. })
                    if attempt >= self.config.max_commit_retries =>
                {
                    warn!(
                        "Table {}: giving up after {} stale commits",
                        self.table_id,
                        attempt + 1
                    );
                    return Err(err);
                }
                Err(TableError::StaleState { expected, actual }) => {
                    attempt += 1;
                    warn!(
                        "Table {}: stale commit (had {}, table at {}), retrying",
                        self.table_id, expected, actual
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn start_hand(&self, dealer: Option<SeatIndex>) -> TableResult<Transition> {
        self.submit(Intent::StartHand { dealer }).await
    }

    pub async fn act(&self, seat: SeatIndex, action: Action) -> TableResult<Transition> {
        self.submit(Intent::Act { seat, action }).await
    }

    /// Act as whoever's turn it is.
    pub async fn act_current(&self, action: Action) -> TableResult<Transition> {
        let seat = self
            .snapshot()
            .await?
            .to_act
            .ok_or(InvalidActionReason::NoActiveHand)?;
        self.act(seat, action).await
    }

    pub async fn buy_in(&self, seat: SeatIndex) -> TableResult<Transition> {
        self.submit(Intent::BuyIn { seat }).await
    }

    pub async fn distribute_pot(&self, awards: Vec<Award>) -> TableResult<Transition> {
        self.submit(Intent::DistributePot { awards }).await
    }
}
