use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postflow_core::{
    load_config, validate_config, AccountDirectory, AutomationOrchestrator, FileAccountDirectory,
    JsonFileSettingsStore, LogFileWriter, LogRelay, MediaStagingManager, PostQueue,
    ProcessWorker, SettingsStore, SharedQueue, Worker,
};
use postflow_server::api::create_router;
use postflow_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long shutdown waits for an in-flight job before giving up on it.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

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

    // Determine config path
    let config_path = std::env::var("POSTFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Worker: {} {:?}", config.worker.program, config.worker.script);

    // Post queue, restored from the snapshot if one is configured
    let queue = match &config.queue.snapshot_path {
        Some(path) => {
            let queue = PostQueue::open(path)
                .with_context(|| format!("Failed to load post snapshot {:?}", path))?;
            info!("Restored {} posts from {:?}", queue.len(), path);
            queue
        }
        None => {
            info!("Post queue is in-memory only");
            PostQueue::new()
        }
    };
    let queue: SharedQueue = Arc::new(RwLock::new(queue));

    let accounts: Arc<dyn AccountDirectory> =
        Arc::new(FileAccountDirectory::new(&config.accounts.path));
    info!("Accounts read from {:?}", config.accounts.path);

    let settings: Arc<dyn SettingsStore> =
        Arc::new(JsonFileSettingsStore::new(&config.settings.path));
    if let Err(e) = settings.load() {
        warn!("Automation settings unreadable, defaults will be used: {}", e);
    }

    let staging = Arc::new(MediaStagingManager::new(config.staging.clone()));
    let worker: Arc<dyn Worker> = Arc::new(ProcessWorker::new(config.worker.clone()));

    // Live log relay, mirrored into daily log files
    let relay = LogRelay::new(config.orchestrator.relay_capacity);
    let log_writer = LogFileWriter::new(&relay, config.logging.dir.clone());
    let writer_handle = tokio::spawn(log_writer.run());

    let orchestrator = AutomationOrchestrator::new(
        config.orchestrator.clone(),
        queue,
        Arc::clone(&accounts),
        Arc::clone(&settings),
        Arc::clone(&staging),
        worker,
        relay,
    );
    info!("Automation orchestrator ready");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        orchestrator.clone(),
        accounts,
        settings,
        staging,
    ));

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

    // Let the in-flight job, if any, reach its terminal status
    info!("Server shutting down...");
    if orchestrator.stop() {
        info!("Waiting for the current post to finish");
    }
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        loop {
            let status = orchestrator.status().await;
            if !status.running && !status.draining {
                break;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    })
    .await;
    if drained.is_err() {
        warn!("Timed out waiting for the current post to finish");
    }

    // Dropping the last relay handle closes the log writer's channel.
    drop(orchestrator);
    if tokio::time::timeout(Duration::from_secs(5), writer_handle)
        .await
        .is_err()
    {
        warn!("Log writer did not stop in time");
    }
    info!("Log writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
