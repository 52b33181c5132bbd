//! Media transfer: download into a scoped spool directory, verify, upload.
//!
//! # Example
//!
//! ```ignore
//! use vidsync_core::transfer::{TransferConfig, TransferWorker, YtDlpDownloader};
//!
//! let config = TransferConfig::default();
//! let downloader = Arc::new(YtDlpDownloader::new(config.clone()));
//! let worker = TransferWorker::new(downloader, store, &config);
//!
//! let outcome = worker.transfer(&item).await;
//! if outcome.is_success() {
//!     ledger.record(&outcome.item_id)?;
//! }
//! ```

mod config;
mod downloader;
mod error;
mod worker;

pub use config::TransferConfig;
pub use downloader::{MediaDownloader, YtDlpDownloader};
pub use error::TransferError;
pub use worker::{
    sanitize_metadata, TransferOutcome, TransferState, TransferStatus, TransferWorker,
};
