//! The dedup ledger: the set of item ids whose media is known to be in storage.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{JsonFileLedgerStore, LedgerError, LedgerStore};

/// Differences between the ledger and the ids actually present in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// In the ledger but absent from storage.
    pub missing: BTreeSet<String>,
    /// In storage but absent from the ledger.
    pub extra: BTreeSet<String>,
    /// Number of ledger entries confirmed present in storage.
    pub verified: usize,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

#[derive(Default)]
struct LedgerState {
    order: Vec<String>,
    index: HashSet<String>,
}

impl LedgerState {
    fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        let mut state = Self::default();
        for id in ids {
            if state.index.insert(id.clone()) {
                state.order.push(id);
            }
        }
        state
    }
}

/// Persistent set of transferred item ids.
///
/// Every mutation is written to the backing store before it becomes
/// visible in memory, so a crash never leaves an acknowledged id
/// unpersisted.
pub struct DedupLedger {
    store: Box<dyn LedgerStore>,
    state: Mutex<LedgerState>,
}

impl DedupLedger {
    /// Open the ledger, loading whatever the store has persisted.
    ///
    /// A store with nothing persisted yields an empty ledger. Duplicate ids
    /// in the persisted list collapse to their first occurrence.
    pub fn open(store: Box<dyn LedgerStore>) -> Result<Self, LedgerError> {
        let state = match store.load()? {
            Some(ids) => {
                let loaded = ids.len();
                let state = LedgerState::from_ids(ids);
                if state.order.len() != loaded {
                    warn!(
                        store = store.name(),
                        duplicates = loaded - state.order.len(),
                        "Ledger contained duplicate ids"
                    );
                }
                state
            }
            None => LedgerState::default(),
        };

        info!(
            store = store.name(),
            entries = state.order.len(),
            "Loaded dedup ledger"
        );

        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ids in recording order.
    pub fn ids(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    /// Snapshot of the id set.
    pub fn id_set(&self) -> HashSet<String> {
        self.lock().index.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a transferred id.
    ///
    /// Returns `Ok(false)` without touching the store if the id is already
    /// present. On a store error the in-memory set is left unchanged.
    pub fn record(&self, id: &str) -> Result<bool, LedgerError> {
        let mut state = self.lock();
        if state.index.contains(id) {
            return Ok(false);
        }

        let mut next = state.order.clone();
        next.push(id.to_string());
        self.store.save(&next)?;

        state.order = next;
        state.index.insert(id.to_string());
        debug!(id = %id, entries = state.order.len(), "Recorded ledger entry");
        Ok(true)
    }

    /// Compare the ledger against the ids present in storage.
    pub fn reconcile(&self, actual: &HashSet<String>) -> ReconcileReport {
        let state = self.lock();

        let missing: BTreeSet<String> = state
            .order
            .iter()
            .filter(|id| !actual.contains(*id))
            .cloned()
            .collect();
        let extra: BTreeSet<String> = actual
            .iter()
            .filter(|id| !state.index.contains(*id))
            .cloned()
            .collect();

        ReconcileReport {
            verified: state.order.len() - missing.len(),
            missing,
            extra,
        }
    }

    /// Drop the given ids. Returns how many were actually removed.
    pub fn remove<'a, I>(&self, ids: I) -> Result<usize, LedgerError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let drop: HashSet<&String> = ids.into_iter().collect();
        let mut state = self.lock();

        let next: Vec<String> = state
            .order
            .iter()
            .filter(|id| !drop.contains(id))
            .cloned()
            .collect();
        let removed = state.order.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.store.save(&next)?;
        *state = LedgerState::from_ids(next);
        info!(removed, entries = state.order.len(), "Removed ledger entries");
        Ok(removed)
    }

    /// Replace the ledger contents with the given ids. Returns the new size.
    pub fn rebuild<I>(&self, ids: I) -> Result<usize, LedgerError>
    where
        I: IntoIterator<Item = String>,
    {
        let next = LedgerState::from_ids(ids);
        let mut state = self.lock();

        self.store.save(&next.order)?;
        *state = next;
        info!(entries = state.order.len(), "Rebuilt ledger");
        Ok(state.order.len())
    }

    /// Write the current contents to a JSON file at `path`.
    pub fn backup_to(&self, path: &Path) -> Result<(), LedgerError> {
        let ids = self.ids();
        JsonFileLedgerStore::new(path).save(&ids)?;
        info!(path = %path.display(), entries = ids.len(), "Backed up ledger");
        Ok(())
    }
}
