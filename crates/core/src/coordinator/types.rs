//! Types for the job coordinator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::{LedgerError, ReconcileReport};
use crate::source::SourceError;
use crate::storage::StorageError;

/// Errors from coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A run or a ledger repair is already in progress.
    #[error("a transfer run is already in progress")]
    Busy,

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A candidate item that carries a media reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItem {
    pub id: String,
    pub title: String,
    /// Canonical media URL.
    pub media_url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// The item a run is currently transferring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentItem {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Live progress of the current (or last) run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatus {
    pub is_running: bool,
    pub run_id: Option<Uuid>,
    /// 1-based index of the item being transferred.
    pub current_index: usize,
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub current_item: Option<CurrentItem>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Why the run ended early, if it did.
    pub error: Option<String>,
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted { run_id: Uuid },
    AlreadyRunning,
}

/// Ledger repair strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Forget ledger entries whose object is gone, so they are transferred again.
    DropMissing,
    /// Replace the ledger with the ids found in storage.
    Rebuild,
}

/// What a repair did.
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub action: RepairAction,
    pub backup_path: PathBuf,
    /// Drift found before repairing.
    pub reconcile: ReconcileReport,
    pub entries_before: usize,
    pub entries_after: usize,
}
