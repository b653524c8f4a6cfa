//! Table manager for spawning and managing multiple table actors.

use super::{
    actor::{TableActor, TableHandle},
    store::{SnapshotStream, TableId, TablePatch, TableStore},
};
use crate::game::{
    errors::{TableError, TableResult},
    state_machine::TableState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Table metadata for discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub id: TableId,
    pub expires_at: DateTime<Utc>,
}

/// In-process table store: one actor per table behind a shared registry.
#[derive(Clone, Default)]
pub struct TableManager {
    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,
}

impl TableManager {
    /// Create a new table manager
    pub fn new() -> Self {
        Self::default()
    }

    async fn handle(&self, table_id: &TableId) -> TableResult<TableHandle> {
        self.tables
            .read()
            .await
            .get(table_id)
            .cloned()
            .ok_or_else(|| TableError::TableNotFound(table_id.to_string()))
    }

    /// Tables currently registered, soonest to expire first
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let tables = self.tables.read().await;
        let mut list: Vec<_> = tables
            .values()
            .map(|handle| TableMetadata {
                id: handle.table_id().clone(),
                expires_at: handle.expires_at(),
            })
            .collect();
        list.sort_by_key(|meta| meta.expires_at);
        list
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Close a table and forget it
    pub async fn close_table(&self, table_id: &TableId) -> TableResult<()> {
        let handle = self
            .tables
            .write()
            .await
            .remove(table_id)
            .ok_or_else(|| TableError::TableNotFound(table_id.to_string()))?;
        handle.close().await;
        log::info!("Closed table {}", table_id);
        Ok(())
    }

    /// Close every table whose expiry has passed at `now`. Returns how many
    /// were removed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<TableHandle> = {
            let mut tables = self.tables.write().await;
            let ids: Vec<TableId> = tables
                .values()
                .filter(|handle| now >= handle.expires_at())
                .map(|handle| handle.table_id().clone())
                .collect();
            ids.iter().filter_map(|id| tables.remove(id)).collect()
        };

        for handle in &expired {
            handle.close().await;
        }
        if !expired.is_empty() {
            log::info!("Swept {} expired tables", expired.len());
        }
        expired.len()
    }
}

#[async_trait]
impl TableStore for TableManager {
    async fn create(&self, initial: TableState) -> TableResult<TableId> {
        initial.config.validate()?;
        if initial.config.is_expired(Utc::now()) {
            return Err(TableError::TableExpired);
        }

        let table_id = TableId::new();
        let (actor, handle) = TableActor::new(table_id.clone(), initial);
        tokio::spawn(actor.run());
        self.tables.write().await.insert(table_id.clone(), handle);
        log::info!("Created table {}", table_id);
        Ok(table_id)
    }

    async fn snapshot(&self, table_id: &TableId) -> TableResult<TableState> {
        self.handle(table_id).await?.snapshot().await
    }

    async fn commit(
        &self,
        table_id: &TableId,
        expected_version: u64,
        patch: TablePatch,
    ) -> TableResult<TableState> {
        self.handle(table_id)
            .await?
            .commit(expected_version, patch)
            .await
    }

    async fn subscribe(&self, table_id: &TableId) -> TableResult<SnapshotStream> {
        let stream = self.handle(table_id).await?.subscribe().await?;
        log::debug!("New subscriber on table {}", table_id);
        Ok(stream)
    }
}
