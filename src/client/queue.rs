//! Durable pending-expense queue.
//!
//! Drafts that could not be submitted are kept, in insertion order, as one
//! JSON array under a single `system_state` key. Every operation reads and
//! writes the whole list. All access goes through one in-process mutex, so an
//! enqueue racing a sweep's write-back is never lost. A second mutex admits one
//! sweep at a time. Clones share both; separate processes writing the same
//! store are not coordinated.

use crate::{
    config::{ClientConfig, database},
    core::expense::DraftExpense,
    entities::{SystemState, system_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Database, DatabaseConnection, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// `system_state` key holding the serialized queue
pub const QUEUE_KEY: &str = "pending_expenses_queue";

/// One draft waiting to be submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEntry {
    /// Client-generated token used only to tell entries apart locally; never sent to the server
    pub local_id: String,
    /// The draft expense to submit
    pub payload: DraftExpense,
}

/// Persisted FIFO of drafts awaiting submission.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    db: DatabaseConnection,
    lock: Arc<Mutex<()>>,
    sweep: Arc<Mutex<()>>,
}

impl PendingQueue {
    /// Wraps a client-side store. Tables must already exist
    /// (see [`crate::config::database::create_tables`]).
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            lock: Arc::new(Mutex::new(())),
            sweep: Arc::new(Mutex::new(())),
        }
    }

    /// Opens the on-device store named by `queue_database_url`, creating tables as needed.
    pub async fn open(config: &ClientConfig) -> Result<Self> {
        let db = Database::connect(&config.queue_database_url).await?;
        database::create_queue_tables(&db).await?;
        debug!("Pending queue store ready");
        Ok(Self::new(db))
    }

    /// Closes the underlying store connection.
    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        Ok(())
    }

    /// Appends a draft to the end of the queue. Never de-duplicates.
    #[instrument(skip(self, payload), fields(category = %payload.category))]
    pub async fn enqueue(&self, payload: DraftExpense) -> Result<PendingEntry> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let entry = PendingEntry {
            local_id: new_local_id(),
            payload,
        };
        entries.push(entry.clone());
        self.store(&entries).await?;
        info!(local_id = %entry.local_id, pending = entries.len(), "Expense saved offline");
        Ok(entry)
    }

    /// Returns every queued entry in insertion order without removing them.
    pub async fn drain(&self) -> Result<Vec<PendingEntry>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Number of queued entries.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.drain().await?.len())
    }

    /// Whether nothing is queued.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Removes one entry. Returns `false` when no entry has this id.
    pub async fn remove(&self, local_id: &str) -> Result<bool> {
        let (removed, _) = self
            .remove_all(&HashSet::from([local_id.to_string()]))
            .await?;
        Ok(removed > 0)
    }

    /// Removes every entry whose id is in `local_ids` from the *current*
    /// persisted list, keeping the others in their relative order.
    ///
    /// Returns `(removed, remaining)`.
    pub(crate) async fn remove_all(&self, local_ids: &HashSet<String>) -> Result<(usize, usize)> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        entries.retain(|e| !local_ids.contains(&e.local_id));
        let removed = before - entries.len();
        if removed > 0 {
            self.store(&entries).await?;
        }
        Ok((removed, entries.len()))
    }

    /// Drops every queued entry, e.g. on logout.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store(&[]).await?;
        info!("Pending expense queue cleared");
        Ok(())
    }

    /// Held for the whole of a sweep, across every handle to this queue.
    pub(crate) async fn begin_sweep(&self) -> MutexGuard<'_, ()> {
        self.sweep.lock().await
    }

    async fn load(&self) -> Result<Vec<PendingEntry>> {
        let record = SystemState::find()
            .filter(system_state::Column::Key.eq(QUEUE_KEY))
            .one(&self.db)
            .await?;

        match record {
            Some(r) => Ok(serde_json::from_str(&r.value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn store(&self, entries: &[PendingEntry]) -> Result<()> {
        let value = serde_json::to_string(entries)?;
        let now = Utc::now().naive_utc();

        let existing = SystemState::find()
            .filter(system_state::Column::Key.eq(QUEUE_KEY))
            .one(&self.db)
            .await?;

        if let Some(record) = existing {
            let mut active_model: system_state::ActiveModel = record.into();
            active_model.value = Set(value);
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            system_state::ActiveModel {
                key: Set(QUEUE_KEY.to_string()),
                value: Set(value),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await?;
        }
        debug!(pending = entries.len(), "Pending queue persisted");
        Ok(())
    }
}

/// `<unix millis>-<random>` token, unique within one device's queue.
fn new_local_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}
