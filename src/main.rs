//! Thumbsmith - thumbnail generator
//!
//! Without arguments the HTTP server is started. With a path argument that path is
//! walked once and the summary is printed as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use thumbsmith::core::RuntimeDependencies;
use thumbsmith::dispatch::{DispatchMetrics, Dispatcher, ObserverSet, TracingObserver};
use thumbsmith::logging::LoggingSystem;
use thumbsmith::server::{ServerState, ThumbnailServer};
use thumbsmith::strategy::PdfiumEngine;
use thumbsmith::{AppConfig, TreeWalker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // Kept alive so buffered file output is flushed on exit
    let _logging_system = match LoggingSystem::init(config.logging.clone()) {
        Ok(system) => {
            tracing::info!("Logging system initialized successfully");
            Some(system)
        }
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}. Using basic logging.", e);
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .init();
            None
        }
    };

    tracing::info!("Starting Thumbsmith...");

    let runtime_status = RuntimeDependencies::check_all(&config.tools);
    let missing = runtime_status.missing();
    if missing.is_empty() {
        tracing::info!("All external tools located");
    } else {
        tracing::warn!(
            missing = ?missing,
            "Some external tools were not found; affected files will get placeholders"
        );
    }

    let engine = Arc::new(PdfiumEngine::new(config.tools.pdfium_library_dir.as_deref()));
    let metrics = Arc::new(DispatchMetrics::new());
    let mut observer = ObserverSet::new().with(metrics.clone());
    if config.logging.dispatch_records {
        observer = observer.with(Arc::new(TracingObserver));
    }

    let dispatcher = Dispatcher::from_config(&config, engine, Arc::new(observer));
    let walker = TreeWalker::new(
        Arc::new(dispatcher),
        config.limits.workers,
        config.walk.clone(),
    );

    if let Some(root) = std::env::args_os().nth(1).map(PathBuf::from) {
        let summary = walker.walk(&root).await;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let server = ThumbnailServer::new(config.server.clone(), ServerState::new(walker, metrics));

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown requested");
        shutdown.cancel();
    });

    server.start().await?;
    Ok(())
}
