//! Dedup ledger of transferred item ids.
//!
//! The ledger is the only record of what has already reached storage.
//! It can be persisted as a JSON file or in SQLite.

mod dedup;
mod json_store;
mod sqlite_store;
mod store;

pub use dedup::{DedupLedger, ReconcileReport};
pub use json_store::JsonFileLedgerStore;
pub use sqlite_store::SqliteLedgerStore;
pub use store::{create_ledger_store, LedgerError, LedgerStore};
