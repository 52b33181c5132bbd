//! Single-flight job coordinator.
//!
//! At most one transfer run executes at a time. A run enumerates pending
//! items, transfers them one by one and records each success in the
//! ledger, publishing progress through a `JobStatus` snapshot that can be
//! read from any thread.

mod config;
mod runner;
mod types;

pub use config::{JobConfig, ShutdownMode};
pub use runner::JobCoordinator;
pub use types::{
    CoordinatorError, CurrentItem, JobStatus, PendingItem, RepairAction, RepairReport,
    StartOutcome,
};
