//! OS signal handling.
//!
//! - SIGINT / SIGTERM → graceful shutdown
//! - SIGHUP → resource reload, not shutdown

use tokio::sync::{broadcast, mpsc};

use crate::config::reloader::ReloadTrigger;

/// Resolves once SIGINT (or SIGTERM on unix) arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

/// Forward SIGHUP to the reloader until shutdown.
#[cfg(unix)]
pub fn forward_hangup(
    trigger_tx: mpsc::UnboundedSender<ReloadTrigger>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, scheduling reload");
                    if trigger_tx.send(ReloadTrigger::Signal).is_err() {
                        break;
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn forward_hangup(
    _trigger_tx: mpsc::UnboundedSender<ReloadTrigger>,
    _shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    Ok(())
}
