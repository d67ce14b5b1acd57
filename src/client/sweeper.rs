//! Reconciliation sweeper - replays queued drafts through a submitter.
//!
//! Each sweep snapshots the queue, tries every entry in insertion order and
//! then removes only the entries that succeeded from the queue as it is *now*.
//! A failing entry does not stop the sweep and is never dropped. Entries
//! enqueued while the sweep is running are not in its snapshot, so they stay
//! queued for the next sweep.
//!
//! There is no idempotency key: if the server stored an expense but the
//! response was lost, the draft stays queued and the next sweep creates a
//! duplicate.

use crate::{
    client::{
        queue::PendingQueue,
        submit::{ExpenseSubmitter, SaveOutcome, save_expense},
    },
    core::expense::DraftExpense,
    errors::Result,
};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries submitted successfully and removed from the queue
    pub flushed: usize,
    /// Entries still queued after the sweep, including ones enqueued during it
    pub remaining: usize,
}

/// Drives the immediate-save path and queue reconciliation for one submitter.
#[derive(Debug)]
pub struct Sweeper<S> {
    submitter: S,
    queue: PendingQueue,
}

impl<S: ExpenseSubmitter> Sweeper<S> {
    /// Creates a sweeper over `queue`.
    pub fn new(submitter: S, queue: PendingQueue) -> Self {
        Self { submitter, queue }
    }

    /// The pending queue this sweeper drains.
    pub const fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// The submitter used for every attempt.
    pub const fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Saves a draft now or queues it on a transient failure.
    pub async fn save(&self, draft: DraftExpense) -> Result<SaveOutcome> {
        save_expense(&self.submitter, &self.queue, draft).await
    }

    /// Runs one sweep and returns how many entries were flushed.
    ///
    /// An empty queue is a no-op returning 0.
    pub async fn sync(&self) -> Result<usize> {
        Ok(self.sync_report().await?.flushed)
    }

    /// Runs one sweep and reports flushed and remaining counts.
    ///
    /// Overlapping sweeps over the same queue, from this sweeper or any other
    /// built on a clone of it, run one after the other, so no entry is
    /// submitted twice by concurrent sweeps.
    #[instrument(skip(self))]
    pub async fn sync_report(&self) -> Result<SyncReport> {
        let _sweeping = self.queue.begin_sweep().await;

        let snapshot = self.queue.drain().await?;
        if snapshot.is_empty() {
            return Ok(SyncReport {
                flushed: 0,
                remaining: 0,
            });
        }

        let mut succeeded = HashSet::new();
        for entry in &snapshot {
            match self.submitter.submit(&entry.payload).await {
                Ok(created) => {
                    if let Some(alert) = &created.alert {
                        info!(kind = ?alert.kind, budget = %alert.category, percent = alert.percent, "Budget alert for synced expense");
                    }
                    succeeded.insert(entry.local_id.clone());
                }
                Err(e) => {
                    warn!(local_id = %entry.local_id, error = %e, "Pending expense still not accepted");
                }
            }
        }

        let (flushed, remaining) = self.queue.remove_all(&succeeded).await?;
        info!(flushed, remaining, "Pending expense sweep finished");
        Ok(SyncReport { flushed, remaining })
    }
}
