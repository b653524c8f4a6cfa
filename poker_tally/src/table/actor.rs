//! Table actor owning one table's canonical state.

use super::{
    messages::TableMessage,
    store::{TableId, TablePatch},
};
use crate::game::{
    errors::{TableError, TableResult},
    state_machine::TableState,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
    expires_at: DateTime<Utc>,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId, expires_at: DateTime<Utc>) -> Self {
        Self {
            sender,
            table_id,
            expires_at,
        }
    }

    /// Get table ID
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> TableResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::StoreClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<TableResult<T>>) -> TableMessage,
    ) -> TableResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| TableError::StoreClosed)?
    }

    pub async fn snapshot(&self) -> TableResult<TableState> {
        self.request(|response| TableMessage::Snapshot { response })
            .await
    }

    pub async fn commit(&self, expected_version: u64, patch: TablePatch) -> TableResult<TableState> {
        self.request(|response| TableMessage::Commit {
            expected_version,
            patch,
            response,
        })
        .await
    }

    pub async fn subscribe(&self) -> TableResult<mpsc::UnboundedReceiver<TableState>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.request(|response| TableMessage::Subscribe { sender, response })
            .await?;
        Ok(receiver)
    }

    /// Ask the actor to stop. A table that's already gone counts as closed.
    pub async fn close(&self) {
        let _ = self.send(TableMessage::Close).await;
    }
}

/// Table actor managing a single table
pub struct TableActor {
    id: TableId,

    /// Canonical state
    state: TableState,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Snapshot subscribers keyed by registration order
    subscribers: HashMap<u64, mpsc::UnboundedSender<TableState>>,

    next_subscriber: u64,

    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: TableId, state: TableState) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let handle = TableHandle::new(sender, id.clone(), state.config.expires_at);

        let actor = Self {
            id,
            state,
            inbox,
            subscribers: HashMap::new(),
            next_subscriber: 0,
            is_closed: false,
        };

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} open until {}", self.id, self.state.config.expires_at);

        let until_expiry = (self.state.config.expires_at - Utc::now())
            .to_std()
            .unwrap_or_default();
        let expiry = tokio::time::sleep(until_expiry);
        tokio::pin!(expiry);
        let mut expired = false;

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }

                    if self.is_closed {
                        break;
                    }
                }

                _ = &mut expiry, if !expired => {
                    expired = true;
                    log::info!("Table {} expired, dropping {} subscribers", self.id, self.subscribers.len());
                    self.subscribers.clear();
                }
            }
        }

        log::info!("Table {} closed", self.id);
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Snapshot { response } => {
                let result = self.check_live().map(|()| self.state.clone());
                let _ = response.send(result);
            }

            TableMessage::Commit {
                expected_version,
                patch,
                response,
            } => {
                let result = self.handle_commit(expected_version, patch);
                let _ = response.send(result);
            }

            TableMessage::Subscribe { sender, response } => {
                let result = self.handle_subscribe(sender);
                let _ = response.send(result);
            }

            TableMessage::Close => {
                self.subscribers.clear();
                self.is_closed = true;
            }
        }
    }

    fn check_live(&self) -> TableResult<()> {
        if self.state.config.is_expired(Utc::now()) {
            return Err(TableError::TableExpired);
        }
        Ok(())
    }

    fn handle_commit(&mut self, expected_version: u64, patch: TablePatch) -> TableResult<TableState> {
        self.check_live()?;
        if expected_version != self.state.version {
            log::warn!(
                "Table {}: rejected commit at version {}, table is at {}",
                self.id,
                expected_version,
                self.state.version
            );
            return Err(TableError::StaleState {
                expected: expected_version,
                actual: self.state.version,
            });
        }

        patch.merge_into(&mut self.state);
        self.state.version += 1;
        log::info!("Table {}: committed version {}", self.id, self.state.version);

        self.notify_state_change();
        Ok(self.state.clone())
    }

    fn handle_subscribe(&mut self, sender: mpsc::UnboundedSender<TableState>) -> TableResult<()> {
        self.check_live()?;
        if sender.send(self.state.clone()).is_err() {
            log::debug!("Table {}: subscriber gone before first snapshot, not adding", self.id);
            return Ok(());
        }
        let key = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.insert(key, sender);
        log::debug!("Table {}: subscriber {} added", self.id, key);
        Ok(())
    }

    /// Push the current snapshot to every subscriber, forgetting closed ones.
    fn notify_state_change(&mut self) {
        let snapshot = &self.state;
        let id = &self.id;
        self.subscribers.retain(|key, sender| {
            if sender.send(snapshot.clone()).is_ok() {
                true
            } else {
                log::debug!("Table {}: subscriber {} disconnected, removing", id, key);
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::config::TableConfig;
    use chrono::Duration;

    fn spawn_table(created_at: DateTime<Utc>) -> TableHandle {
        let config = TableConfig::new(2, 100, 5, created_at).unwrap();
        let state = TableState::with_default_players(config).unwrap();
        let (actor, handle) = TableActor::new(TableId::new(), state);
        tokio::spawn(actor.run());
        handle
    }

    #[tokio::test]
    async fn test_commit_bumps_version() {
        let handle = spawn_table(Utc::now());
        let patch = TablePatch {
            pot: Some(0),
            ..TablePatch::default()
        };
        let committed = handle.commit(0, patch).await.unwrap();
        assert_eq!(committed.version, 1);
        assert_eq!(handle.snapshot().await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_stale_commit_rejected() {
        let handle = spawn_table(Utc::now());
        handle.commit(0, TablePatch::default()).await.unwrap();
        let err = handle.commit(0, TablePatch::default()).await.unwrap_err();
        assert_eq!(
            err,
            TableError::StaleState {
                expected: 0,
                actual: 1
            }
        );
    }

    #[tokio::test]
    async fn test_subscriber_gets_current_snapshot_first() {
        let handle = spawn_table(Utc::now());
        handle.commit(0, TablePatch::default()).await.unwrap();
        let mut stream = handle.subscribe().await.unwrap();
        assert_eq!(stream.recv().await.unwrap().version, 1);
        handle.commit(1, TablePatch::default()).await.unwrap();
        assert_eq!(stream.recv().await.unwrap().version, 2);
    }

    #[test]
    fn test_subscriber_closed_before_first_snapshot_is_not_kept() {
        let config = TableConfig::new(2, 100, 5, Utc::now()).unwrap();
        let state = TableState::with_default_players(config).unwrap();
        let (mut actor, _handle) = TableActor::new(TableId::new(), state);

        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        assert!(actor.handle_subscribe(sender).is_ok());
        assert!(actor.subscribers.is_empty());

        let (sender, _receiver) = mpsc::unbounded_channel();
        actor.handle_subscribe(sender).unwrap();
        assert_eq!(actor.subscribers.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_table_refuses_reads() {
        let handle = spawn_table(Utc::now() - Duration::hours(25));
        assert_eq!(handle.snapshot().await.unwrap_err(), TableError::TableExpired);
        assert!(handle.subscribe().await.is_err());
    }

    #[tokio::test]
    async fn test_closed_table_reports_store_closed() {
        let handle = spawn_table(Utc::now());
        handle.close().await;
        tokio::task::yield_now().await;
        assert_eq!(handle.snapshot().await.unwrap_err(), TableError::StoreClosed);
    }
}
