//! Ledger storage trait and errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{LedgerBackend, LedgerConfig};

use super::{JsonFileLedgerStore, SqliteLedgerStore};

/// Errors from ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger file is not a list of ids: {0}")]
    Format(String),

    #[error("Ledger database error: {0}")]
    Database(String),
}

/// Persistence for the ordered list of transferred ids.
///
/// Every `save` rewrites the whole list.
pub trait LedgerStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Load the persisted list; `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Vec<String>>, LedgerError>;

    /// Replace the persisted list.
    fn save(&self, ids: &[String]) -> Result<(), LedgerError>;
}

/// Create the store selected in configuration.
pub fn create_ledger_store(config: &LedgerConfig) -> Result<Box<dyn LedgerStore>, LedgerError> {
    match config.backend {
        LedgerBackend::Json => Ok(Box::new(JsonFileLedgerStore::new(&config.path))),
        LedgerBackend::Sqlite => Ok(Box::new(SqliteLedgerStore::new(&config.path)?)),
    }
}
