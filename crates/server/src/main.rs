use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidsync_core::{
    create_ledger_store, load_config, validate_config, DedupLedger, JobCoordinator,
    MediaDownloader, ObjectStore, PageSource, RetryPolicy, S3ObjectStore, ShutdownMode,
    SourceEnumerator, TransferWorker, WordPressSource, YtDlpDownloader,
};
use vidsync_server::api::create_router;
use vidsync_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("vidsync {}", VERSION);

    // Determine config path
    let config_path = std::env::var("VIDSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Source: {}", config.source.url);
    info!("Bucket: {} ({})", config.storage.bucket, config.storage.region);
    info!(
        "Ledger: {:?} at {:?}",
        config.ledger.backend, config.ledger.path
    );

    let source: Arc<dyn PageSource> = Arc::new(
        WordPressSource::new(&config.source).context("Failed to create WordPress source")?,
    );
    let enumerator = SourceEnumerator::new(source, RetryPolicy::from_config(&config.source));

    let ledger_store =
        create_ledger_store(&config.ledger).context("Failed to open ledger store")?;
    let ledger = Arc::new(DedupLedger::open(ledger_store).context("Failed to load ledger")?);
    info!("Ledger loaded with {} entries", ledger.len());

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::from_config(&config.storage).await);
    info!("Object store initialized ({})", store.name());

    let yt_dlp = YtDlpDownloader::new(config.transfer.clone());
    match yt_dlp.validate().await {
        Ok(version) => info!("Using yt-dlp {}", version),
        // Runs fail per item until the binary shows up; previews still work.
        Err(e) => warn!("yt-dlp is not usable: {}", e),
    }
    let downloader: Arc<dyn MediaDownloader> = Arc::new(yt_dlp);

    let worker = TransferWorker::new(downloader, Arc::clone(&store), &config.transfer);

    let coordinator = Arc::new(JobCoordinator::new(
        enumerator,
        ledger,
        store,
        worker,
        config.source.per_page,
    ));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&coordinator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if coordinator.is_running() {
        match config.job.shutdown {
            ShutdownMode::Wait => {
                info!("Waiting for the current run to finish");
                coordinator.wait().await;
            }
            ShutdownMode::Abandon => {
                info!("Abandoning the current run");
                coordinator.abort().await;
            }
        }
    }
    info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
