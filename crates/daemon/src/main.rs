//! Transflow Daemon - Main Entry Point
//! JSON-RPC server + dispatcher over a SQLite snapshot store

mod config;
mod logging;

use anyhow::{Context, Result};
use config::{DaemonConfig, StageMode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use transflow_api_rpc::{RpcHandler, RpcServer};
use transflow_core::application::{
    job_queue, Dispatcher, PipelinePorts, StatusService, SubmissionService,
};
use transflow_core::port::time_provider::SystemTimeProvider;
use transflow_core::port::{
    LogSink, ReverseTransform, SnapshotStore, TimeProvider, TransformStage,
};
use transflow_infra_remote::{
    AzureTranslator, HttpLogSink, RpcSecondaryTranslator, TracingLogSink, XmlTransformClient,
};
use transflow_infra_sqlite::{create_pool, database_url, run_migrations, SqliteSnapshotStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration (before logging, which it configures)
    let config = DaemonConfig::load()?;
    let _log_guard = logging::init(&config.logging)?;

    info!("Transflow daemon v{} starting...", VERSION);

    // 2. Database
    let db_path = config.store_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!(db_path = %db_path.display(), "Initializing database...");

    let pool = create_pool(&database_url(&db_path))
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    let store = Arc::new(SqliteSnapshotStore::new(pool.clone()));
    if config.store.reset_on_start {
        let removed = store.reset().await.context("Store reset failed")?;
        info!(removed, "Snapshot store reset");
    }

    // 3. DI wiring
    let ports = build_ports(&config)?;
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let (queue_tx, queue_rx) = job_queue();

    let dispatcher = Arc::new(
        Dispatcher::new(
            queue_rx,
            store.clone(),
            ports,
            time_provider.clone(),
            config.dispatcher_config(),
        )
        .context("Invalid dispatcher configuration")?,
    );

    // 4. JSON-RPC server
    let handler = RpcHandler::new(
        SubmissionService::new(store.clone(), queue_tx).with_time_provider(time_provider),
        StatusService::new(store),
        dispatcher.activity(),
    );
    let (rpc_addr, rpc_handle) = RpcServer::new(config.rpc_server_config(), handler)
        .start()
        .await
        .context("RPC server start failed")?;

    // 5. Dispatcher
    let running = Arc::clone(&dispatcher);
    let dispatcher_handle = tokio::spawn(async move {
        if let Err(e) = running.run().await {
            error!(error = %e, "Dispatcher failed");
        }
    });

    info!(addr = %rpc_addr, "System ready. Waiting for translations...");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    dispatcher.stop();
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, dispatcher_handle)
        .await
        .is_err()
    {
        warn!("Dispatcher did not stop in time; in-flight job left as PROCESSING");
    }
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}

/// Pick adapters for each pipeline stage from the configured modes
fn build_ports(config: &DaemonConfig) -> Result<PipelinePorts> {
    let provider = Arc::new(AzureTranslator::new(
        config.provider.endpoint.clone(),
        config.provider.api_key.clone(),
        config.provider.region.clone(),
    ));

    let transform: Arc<dyn TransformStage> = match config.transform.mode {
        StageMode::Remote => Arc::new(XmlTransformClient::new(config.transform.url.clone())),
        StageMode::Local => Arc::new(ReverseTransform),
    };

    let secondary = Arc::new(
        RpcSecondaryTranslator::new(&config.secondary.url, config.secondary.method.clone())
            .context("Invalid secondary stage URL")?,
    );

    let log_sink: Arc<dyn LogSink> = match config.log_sink.mode {
        StageMode::Remote => Arc::new(HttpLogSink::new(config.log_sink.url.clone())),
        StageMode::Local => Arc::new(TracingLogSink),
    };

    info!(
        transform = ?config.transform.mode,
        log_sink = ?config.log_sink.mode,
        secondary = %config.secondary.url,
        "Pipeline adapters configured"
    );

    Ok(PipelinePorts {
        provider,
        transform,
        secondary,
        log_sink,
    })
}
