//! Transfer run lifecycle integration tests.
//!
//! These tests drive complete runs through the coordinator with a JSON
//! ledger on disk: enumerate -> extract -> download -> upload -> record.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use vidsync_core::{
    source::RetryPolicy,
    testing::{fixtures, MockDownload, MockDownloader, MockObjectStore, MockPageSource},
    DedupLedger, JobCoordinator, JsonFileLedgerStore, RepairAction, SourceEnumerator,
    StartOutcome, TransferConfig, TransferWorker,
};

/// Test helper wiring every component against mocks and a temp dir.
struct TestHarness {
    source: Arc<MockPageSource>,
    downloader: Arc<MockDownloader>,
    store: Arc<MockObjectStore>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new(source: MockPageSource) -> Self {
        Self {
            source: Arc::new(source),
            downloader: Arc::new(MockDownloader::new()),
            store: Arc::new(MockObjectStore::new()),
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn ledger_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("uploaded_videos.json")
    }

    fn spool_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("spool")
    }

    /// Build a fresh coordinator, reloading the ledger from disk as a restart would.
    fn coordinator(&self) -> JobCoordinator {
        let ledger = Arc::new(
            DedupLedger::open(Box::new(JsonFileLedgerStore::new(self.ledger_path())))
                .expect("Failed to open ledger"),
        );
        let retry = RetryPolicy {
            max_consecutive_failures: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let config = TransferConfig::default().with_spool_dir(self.spool_path());
        let worker = TransferWorker::new(self.downloader.clone(), self.store.clone(), &config);

        JobCoordinator::new(
            SourceEnumerator::new(self.source.clone(), retry),
            ledger,
            self.store.clone(),
            worker,
            100,
        )
    }

    fn persisted_ids(&self) -> Vec<String> {
        let raw = std::fs::read_to_string(self.ledger_path()).unwrap_or_else(|_| "[]".into());
        serde_json::from_str(&raw).expect("ledger file should be a JSON array")
    }

    fn spool_is_empty(&self) -> bool {
        match std::fs::read_dir(self.spool_path()) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }
}

fn mixed_pages() -> Vec<Vec<vidsync_core::ContentItem>> {
    vec![
        vec![
            fixtures::post_with_video("101", "dQw4w9WgXcQ"),
            fixtures::post_without_video("102"),
            fixtures::content_item(
                "103",
                "Short link",
                "<p>See https://youtu.be/9bZkp7q19f0 for details</p>",
            ),
        ],
        vec![
            fixtures::content_item(
                "104",
                "Watch link",
                "<a href=\"https://www.youtube.com/watch?v=kJQP7kiw5Fk&t=42\">video</a>",
            ),
            fixtures::post_without_video("105"),
        ],
    ]
}

async fn run_to_completion(coordinator: &JobCoordinator, max_items: Option<usize>) {
    match coordinator.start(max_items) {
        StartOutcome::Accepted { .. } => coordinator.wait().await,
        StartOutcome::AlreadyRunning => panic!("expected the run to be accepted"),
    }
}

#[tokio::test]
async fn test_full_run_transfers_every_media_post() {
    let harness = TestHarness::new(
        MockPageSource::new()
            .with_pages(mixed_pages())
            .with_total_pages(2),
    );
    let coordinator = harness.coordinator();

    run_to_completion(&coordinator, None).await;

    let status = coordinator.status();
    assert!(!status.is_running);
    assert_eq!(status.total, 3);
    assert_eq!(status.successes, 3);
    assert_eq!(status.failures, 0);

    assert_eq!(
        harness.store.keys().await,
        vec!["videos/101.mp4", "videos/103.mp4", "videos/104.mp4"]
    );
    assert_eq!(harness.persisted_ids(), vec!["101", "103", "104"]);
    assert_eq!(
        harness.downloader.requested_urls().await,
        vec![
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=9bZkp7q19f0",
            "https://www.youtube.com/watch?v=kJQP7kiw5Fk",
        ]
    );
    assert!(harness.spool_is_empty());
}

#[tokio::test]
async fn test_restart_resumes_without_duplicates() {
    let harness = TestHarness::new(
        MockPageSource::new()
            .with_pages(mixed_pages())
            .with_total_pages(2),
    );

    // First run stops after one media item.
    let first = harness.coordinator();
    run_to_completion(&first, Some(1)).await;
    assert_eq!(harness.persisted_ids(), vec!["101"]);
    drop(first);

    // A fresh process picks up the remaining items only.
    let second = harness.coordinator();
    let pending = second.pending(None).await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["103", "104"]);

    run_to_completion(&second, None).await;
    assert_eq!(second.status().successes, 2);
    assert_eq!(harness.persisted_ids(), vec!["101", "103", "104"]);
    assert_eq!(harness.downloader.requested_urls().await.len(), 3);
}

#[tokio::test]
async fn test_zero_byte_download_leaves_ledger_unchanged() {
    let harness = TestHarness::new(
        MockPageSource::new()
            .with_pages(mixed_pages())
            .with_total_pages(2),
    );
    harness
        .downloader
        .set_behavior("103", MockDownload::Empty)
        .await;
    let coordinator = harness.coordinator();

    run_to_completion(&coordinator, None).await;

    let status = coordinator.status();
    assert_eq!(status.successes, 2);
    assert_eq!(status.failures, 1);
    assert_eq!(harness.persisted_ids(), vec!["101", "104"]);
    assert!(harness.store.object("videos/103.mp4").await.is_none());
    assert!(harness.spool_is_empty());

    // The failed item is offered again on the next run.
    harness
        .downloader
        .set_behavior("103", MockDownload::default())
        .await;
    run_to_completion(&coordinator, None).await;
    assert_eq!(coordinator.status().successes, 1);
    assert_eq!(harness.persisted_ids(), vec!["101", "104", "103"]);
}

#[tokio::test]
async fn test_concurrent_start_is_single_flight() {
    let harness = TestHarness::new(
        MockPageSource::new()
            .with_pages(mixed_pages())
            .with_total_pages(2),
    );
    harness
        .downloader
        .set_delay(Duration::from_millis(100))
        .await;
    let coordinator = harness.coordinator();

    let first = coordinator.start(None);
    assert!(matches!(first, StartOutcome::Accepted { .. }));
    for _ in 0..5 {
        assert_eq!(coordinator.start(None), StartOutcome::AlreadyRunning);
    }

    coordinator.wait().await;
    assert_eq!(coordinator.status().successes, 3);
    assert_eq!(harness.downloader.requested_urls().await.len(), 3);
}

#[tokio::test]
async fn test_status_progress_is_visible_mid_run() {
    let harness = TestHarness::new(
        MockPageSource::new()
            .with_pages(mixed_pages())
            .with_total_pages(2),
    );
    harness
        .downloader
        .set_delay(Duration::from_millis(300))
        .await;
    let coordinator = harness.coordinator();

    coordinator.start(None);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = coordinator.status();
    assert!(status.is_running);
    assert_eq!(status.total, 3);
    assert_eq!(status.current_index, 1);
    assert_eq!(
        status.current_item.as_ref().map(|c| c.id.as_str()),
        Some("101")
    );

    coordinator.abort().await;
    assert!(!coordinator.status().is_running);
}

#[tokio::test]
async fn test_reconcile_detects_drift_and_repairs() {
    let harness = TestHarness::new(MockPageSource::new());
    std::fs::write(harness.ledger_path(), r#"["1", "2"]"#).unwrap();
    harness.store.insert_key("videos/2.mp4").await;
    harness.store.insert_key("videos/3.mp4").await;
    let coordinator = harness.coordinator();

    let report = coordinator.reconcile().await.unwrap();
    assert_eq!(report.missing, BTreeSet::from(["1".to_string()]));
    assert_eq!(report.extra, BTreeSet::from(["3".to_string()]));

    // Reconciliation alone never mutates the ledger.
    assert_eq!(harness.persisted_ids(), vec!["1", "2"]);

    let backup = harness.temp_dir.path().join("uploaded_videos_backup.json");
    coordinator
        .repair(RepairAction::Rebuild, &backup)
        .await
        .unwrap();

    assert_eq!(harness.persisted_ids(), vec!["2", "3"]);
    let backed_up: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&backup).unwrap()).unwrap();
    assert_eq!(backed_up, vec!["1", "2"]);
    assert!(coordinator.reconcile().await.unwrap().is_consistent());
}
