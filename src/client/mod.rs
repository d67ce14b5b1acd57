//! Offline-first client pipeline.
//!
//! Drafts go through an [`ExpenseSubmitter`] once; transient failures land in
//! the durable [`PendingQueue`], and the [`Sweeper`] replays the queue whenever
//! the app gets a chance (foregrounding, an explicit retry).

/// Injectable in-memory expense service
pub mod memory;
/// Durable FIFO of drafts awaiting submission
pub mod queue;
/// Single-attempt submission and the immediate-save path
pub mod submit;
/// Queue reconciliation
pub mod sweeper;

pub use memory::InMemoryBackend;
pub use queue::{PendingEntry, PendingQueue};
pub use submit::{ExpenseSubmitter, HttpSubmitter, SaveOutcome, save_expense};
pub use sweeper::{SyncReport, Sweeper};
