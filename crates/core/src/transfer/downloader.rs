//! Media downloader trait and the yt-dlp implementation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::metrics;

use super::{TransferConfig, TransferError};

/// Fetches the media behind a canonical URL into a local directory.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Downloader name for logging.
    fn name(&self) -> &str;

    /// Download `url` into `dest_dir`, naming the file after `item_id`.
    ///
    /// Returns the path of the downloaded file.
    async fn download(
        &self,
        url: &str,
        item_id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, TransferError>;
}

/// Downloader that shells out to yt-dlp.
pub struct YtDlpDownloader {
    config: TransferConfig,
}

/// Keep at most this many trailing bytes of stderr in errors.
const STDERR_TAIL: usize = 500;

impl YtDlpDownloader {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    /// Check that the binary can be executed. Returns its version.
    pub async fn validate(&self) -> Result<String, TransferError> {
        let output = Command::new(&self.config.yt_dlp_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(TransferError::download_failed(
                format!("yt-dlp --version exited with code: {:?}", output.status.code()),
                None,
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn spawn_error(&self, e: std::io::Error) -> TransferError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TransferError::DownloaderMissing {
                path: self.config.yt_dlp_path.clone(),
            }
        } else {
            TransferError::Io(e)
        }
    }

    /// Build the yt-dlp argument list.
    pub(crate) fn build_args(&self, url: &str, item_id: &str, dest_dir: &Path) -> Vec<OsString> {
        let template = dest_dir.join(format!("{item_id}.%(ext)s"));

        let mut args: Vec<OsString> = vec![
            "-f".into(),
            self.config.format.clone().into(),
            "--no-part".into(),
            "--force-overwrites".into(),
            "--no-playlist".into(),
            "--no-progress".into(),
            "--no-simulate".into(),
            "--print".into(),
            "after_move:filepath".into(),
            "--user-agent".into(),
            self.config.user_agent.clone().into(),
            "-o".into(),
            template.into_os_string(),
        ];

        if let Some(cookies) = &self.config.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.clone().into_os_string());
        }

        args.push(url.into());
        args
    }
}

/// Last non-empty line of yt-dlp's stdout, which `--print after_move:filepath` fills.
fn printed_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(PathBuf::from)
}

/// Find a file named `{item_id}.*` in `dir`.
async fn find_output(dir: &Path, item_id: &str) -> Option<PathBuf> {
    let prefix = format!("{item_id}.");
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            return Some(entry.path());
        }
    }
    None
}

fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    Some(text[start..].to_string())
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(
        &self,
        url: &str,
        item_id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, TransferError> {
        let args = self.build_args(url, item_id, dest_dir);
        debug!(item_id = %item_id, url = %url, dir = %dest_dir.display(), "Starting yt-dlp");

        let child = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let start = Instant::now();
        let result = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await;

        let outcome = match &result {
            Ok(Ok(output)) if output.status.success() => "success",
            _ => "error",
        };
        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["yt-dlp", "download"])
            .observe(start.elapsed().as_secs_f64());
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["yt-dlp", "download", outcome])
            .inc();

        // On timeout the child is dropped, and kill_on_drop terminates it.
        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(TransferError::Io(e)),
            Err(_) => {
                warn!(item_id = %item_id, timeout_secs = self.config.timeout_secs, "yt-dlp timed out");
                return Err(TransferError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            return Err(TransferError::download_failed(
                format!("yt-dlp exited with code: {:?}", output.status.code()),
                stderr_tail(&output.stderr),
            ));
        }

        if let Some(path) = printed_path(&output.stdout) {
            return Ok(path);
        }

        // Older yt-dlp builds print nothing for after_move; fall back to the template name.
        find_output(dest_dir, item_id).await.ok_or_else(|| {
            TransferError::download_failed(
                "yt-dlp reported success but produced no file",
                stderr_tail(&output.stderr),
            )
        })
    }
}
