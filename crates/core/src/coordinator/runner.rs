//! Job coordinator implementation.
//!
//! A run is a tokio task that owns nothing but an `Arc` to the shared
//! state; the coordinator keeps its `JoinHandle` so shutdown can wait for
//! or cancel it.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::extractor::MediaReferenceExtractor;
use crate::ledger::{DedupLedger, ReconcileReport};
use crate::metrics;
use crate::source::SourceEnumerator;
use crate::storage::{stored_item_ids, ObjectStore};
use crate::transfer::TransferWorker;

use super::types::{
    CoordinatorError, CurrentItem, JobStatus, PendingItem, RepairAction, RepairReport,
    StartOutcome,
};

/// State shared between the coordinator and its run task.
struct Shared {
    enumerator: SourceEnumerator,
    extractor: MediaReferenceExtractor,
    ledger: Arc<DedupLedger>,
    store: Arc<dyn ObjectStore>,
    worker: TransferWorker,
    page_size: u32,

    running: AtomicBool,
    status: RwLock<JobStatus>,
}

/// Clears the running flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Finalizes the run status when dropped, including on panic or abort.
///
/// Created before the run task is spawned and moved into it, so a task
/// cancelled before its first poll still finalizes.
struct RunGuard {
    shared: Arc<Shared>,
    run_id: Uuid,
    error: Option<String>,
}

impl RunGuard {
    fn new(shared: Arc<Shared>, run_id: Uuid) -> Self {
        Self {
            shared,
            run_id,
            error: Some("run was interrupted".to_string()),
        }
    }

    async fn run(mut self, max_items: Option<usize>) {
        let shared = Arc::clone(&self.shared);
        let run_id = self.run_id;

        self.error = match shared.execute(run_id, max_items).await {
            Ok(()) => None,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Run aborted");
                Some(e.to_string())
            }
        };
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.shared.finish(self.run_id, self.error.take());
    }
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut JobStatus)) {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        f(&mut status);
    }

    fn snapshot(&self) -> JobStatus {
        self.status
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Enumerate candidates and keep those with a media reference.
    async fn collect_pending(
        &self,
        max_items: Option<usize>,
    ) -> Result<Vec<PendingItem>, CoordinatorError> {
        let mut stream = self
            .enumerator
            .enumerate(self.ledger.id_set(), self.page_size, None);
        let mut pending = Vec::new();
        let mut without_media = 0usize;

        while max_items.is_none_or(|max| pending.len() < max) {
            let Some(item) = stream.next().await? else {
                break;
            };

            match self.extractor.extract(&item.raw_content) {
                Some(media_url) => pending.push(PendingItem {
                    id: item.id,
                    title: item.title,
                    media_url,
                    published_at: item.published_at,
                }),
                None => {
                    debug!(item_id = %item.id, "No media reference");
                    without_media += 1;
                }
            }
        }

        let stats = stream.stats();
        info!(
            pending = pending.len(),
            without_media,
            pages = stats.pages_fetched,
            already_transferred = stats.items_skipped,
            "Collected pending items"
        );
        Ok(pending)
    }

    async fn execute(&self, run_id: Uuid, max_items: Option<usize>) -> Result<(), CoordinatorError> {
        let pending = self.collect_pending(max_items).await?;
        let total = pending.len();
        self.update(|s| s.total = total);
        info!(run_id = %run_id, total, "Starting transfers");

        for (index, item) in pending.iter().enumerate() {
            self.update(|s| {
                s.current_index = index + 1;
                s.current_item = Some(CurrentItem {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    url: item.media_url.clone(),
                });
            });
            info!(
                run_id = %run_id,
                item_id = %item.id,
                index = index + 1,
                total,
                "Transferring item"
            );

            let outcome = self.worker.transfer(item).await;

            // The ledger write must land before the item counts as a success.
            let succeeded = outcome.is_success()
                && match self.ledger.record(&item.id) {
                    Ok(_) => true,
                    Err(e) => {
                        error!(
                            item_id = %item.id,
                            key = ?outcome.storage_key,
                            error = %e,
                            "Uploaded but failed to record in ledger"
                        );
                        metrics::TRANSFERS_TOTAL
                            .with_label_values(&["ledger_failed"])
                            .inc();
                        false
                    }
                };

            self.update(|s| {
                if succeeded {
                    s.successes += 1;
                } else {
                    s.failures += 1;
                }
            });
        }

        Ok(())
    }

    fn finish(&self, run_id: Uuid, error: Option<String>) {
        let failed = error.is_some();
        let mut status = JobStatus::default();
        self.update(|s| {
            s.is_running = false;
            s.completed_at = Some(Utc::now());
            s.current_item = None;
            s.error = error;
            status = s.clone();
        });
        // Cleared last so a new start always sees the finalized snapshot.
        self.running.store(false, Ordering::SeqCst);

        metrics::RUNS_TOTAL
            .with_label_values(&[if failed { "failed" } else { "completed" }])
            .inc();

        info!(
            run_id = %run_id,
            successes = status.successes,
            failures = status.failures,
            total = status.total,
            error = ?status.error,
            "Run finished"
        );
    }
}

/// Runs transfers in the background, one run at a time.
pub struct JobCoordinator {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobCoordinator {
    /// Create a coordinator.
    pub fn new(
        enumerator: SourceEnumerator,
        ledger: Arc<DedupLedger>,
        store: Arc<dyn ObjectStore>,
        worker: TransferWorker,
        page_size: u32,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                enumerator,
                extractor: MediaReferenceExtractor::new(),
                ledger,
                store,
                worker,
                page_size,
                running: AtomicBool::new(false),
                status: RwLock::new(JobStatus::default()),
            }),
            handle: Mutex::new(None),
        }
    }

    /// The ledger runs record into.
    pub fn ledger(&self) -> &Arc<DedupLedger> {
        &self.shared.ledger
    }

    /// The object store items are uploaded to.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.shared.store
    }

    /// Start a run in the background.
    ///
    /// Must be called from within a tokio runtime. A rejected start leaves
    /// the status of the active run untouched.
    pub fn start(&self, max_items: Option<usize>) -> StartOutcome {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            warn!("Transfer run already in progress");
            return StartOutcome::AlreadyRunning;
        }

        let run_id = Uuid::new_v4();
        self.shared.update(|s| {
            *s = JobStatus {
                is_running: true,
                run_id: Some(run_id),
                started_at: Some(Utc::now()),
                ..Default::default()
            };
        });
        info!(run_id = %run_id, max_items = ?max_items, "Starting transfer run");

        let guard = RunGuard::new(Arc::clone(&self.shared), run_id);
        let handle = tokio::spawn(guard.run(max_items));
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

        StartOutcome::Accepted { run_id }
    }

    /// Snapshot of the current (or last) run.
    pub fn status(&self) -> JobStatus {
        self.shared.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Items a run would transfer now, without transferring anything.
    pub async fn pending(
        &self,
        max_items: Option<usize>,
    ) -> Result<Vec<PendingItem>, CoordinatorError> {
        self.shared.collect_pending(max_items).await
    }

    /// Compare the ledger against a fresh storage listing.
    pub async fn reconcile(&self) -> Result<ReconcileReport, CoordinatorError> {
        let actual = stored_item_ids(self.shared.store.as_ref()).await?;
        let report = self.shared.ledger.reconcile(&actual);
        info!(
            missing = report.missing.len(),
            extra = report.extra.len(),
            verified = report.verified,
            "Reconciled ledger against storage"
        );
        Ok(report)
    }

    /// Repair ledger drift after backing the ledger up to `backup_path`.
    ///
    /// Refused with `Busy` while a run is active; starting a run during a
    /// repair is refused the same way.
    pub async fn repair(
        &self,
        action: RepairAction,
        backup_path: &Path,
    ) -> Result<RepairReport, CoordinatorError> {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(CoordinatorError::Busy);
        }
        let _busy = BusyGuard(&self.shared.running);

        let ledger = &self.shared.ledger;
        let actual = stored_item_ids(self.shared.store.as_ref()).await?;
        let reconcile = ledger.reconcile(&actual);
        let entries_before = ledger.len();

        ledger.backup_to(backup_path)?;

        let entries_after = match action {
            RepairAction::DropMissing => {
                ledger.remove(&reconcile.missing)?;
                ledger.len()
            }
            RepairAction::Rebuild => {
                let mut ids: Vec<String> = actual.into_iter().collect();
                ids.sort();
                ledger.rebuild(ids)?
            }
        };

        info!(
            action = ?action,
            entries_before,
            entries_after,
            backup = %backup_path.display(),
            "Repaired ledger"
        );

        Ok(RepairReport {
            action,
            backup_path: backup_path.to_path_buf(),
            reconcile,
            entries_before,
            entries_after,
        })
    }

    /// Wait for the active run, if any, to finish.
    pub async fn wait(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Run task ended abnormally");
            }
        }
    }

    /// Cancel the active run, if any, and wait for it to unwind.
    pub async fn abort(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Err(e) if e.is_cancelled() => info!("Run cancelled"),
                Err(e) => warn!(error = %e, "Run task ended abnormally"),
                Ok(()) => {}
            }
        }
    }
}
