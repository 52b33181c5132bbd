pub mod config;
pub mod coordinator;
pub mod extractor;
pub mod ledger;
pub mod metrics;
pub mod source;
pub mod storage;
pub mod testing;
pub mod transfer;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LedgerBackend,
    LedgerConfig, ServerConfig, SourceConfig, StorageConfig,
};
pub use coordinator::{
    CoordinatorError, CurrentItem, JobConfig, JobCoordinator, JobStatus, PendingItem,
    RepairAction, RepairReport, ShutdownMode, StartOutcome,
};
pub use extractor::{MediaMatch, MediaReference, MediaReferenceExtractor};
pub use ledger::{
    create_ledger_store, DedupLedger, JsonFileLedgerStore, LedgerError, LedgerStore,
    ReconcileReport, SqliteLedgerStore,
};
pub use source::{
    ContentItem, PageSource, RetryPolicy, SourceEnumerator, SourceError, SourcePage,
    WordPressSource,
};
pub use storage::{ObjectMetadata, ObjectStore, S3ObjectStore, StorageError};
pub use transfer::{
    MediaDownloader, TransferConfig, TransferError, TransferOutcome, TransferStatus,
    TransferWorker, YtDlpDownloader,
};
