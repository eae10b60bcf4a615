//! Startup orchestration.
//!
//! # Order
//! 1. Load the resource table (fatal on error: nothing to serve)
//! 2. Start the metrics endpoint, if enabled
//! 3. Start the reloader, SIGHUP forwarding and the optional file watcher
//! 4. Bind the listener and serve until shutdown
//! 5. Stop background tasks

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ConfigReloader, ConfigStore, FileSource, ServerConfig};
use crate::config::watcher::ConfigWatcher;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::resolver::ResolutionEngine;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load resources: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to watch resource file: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the service until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let store = Arc::new(ConfigStore::open(FileSource::new(&config.resources.path))?);
    let engine = Arc::new(ResolutionEngine::new(Arc::clone(&store)));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let (reloader, trigger_tx) =
        ConfigReloader::new(Arc::clone(&store), config.resources.reload_interval());
    let reloader_handle = tokio::spawn(reloader.run(shutdown.subscribe()));

    signals::forward_hangup(trigger_tx.clone(), shutdown.subscribe())?;

    // Dropping the watcher stops it, so it lives until the server returns.
    let _watcher = if config.resources.watch {
        Some(ConfigWatcher::new(&config.resources.path, trigger_tx.clone()).run()?)
    } else {
        None
    };
    drop(trigger_tx);

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::shutdown_signal().await;
            shutdown.trigger();
        });
    }

    let server = HttpServer::new(config, engine);
    let result = server.run(listener, shutdown.subscribe()).await;

    shutdown.trigger();
    if let Err(e) = reloader_handle.await {
        tracing::error!(error = %e, "Config reloader task failed");
    }

    result.map_err(StartupError::from)
}
