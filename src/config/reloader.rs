//! Periodic resource reloading.
//!
//! # Responsibilities
//! - Reload the resource table on a fixed interval
//! - Reload on demand (SIGHUP, file change) through the same path
//! - Stop on shutdown
//!
//! # Design Decisions
//! - Exactly one task performs reloads, and it awaits each one before
//!   looking at the next tick or trigger, so reload N finishes before N+1
//! - Missed ticks are fired late rather than dropped
//! - The first tick lands one interval after startup; startup already loaded

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

use crate::config::store::ConfigStore;

/// Why an out-of-band reload was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// SIGHUP or an explicit request.
    Signal,
    /// The watcher saw the resource file change.
    FileChanged,
}

impl ReloadTrigger {
    fn as_str(self) -> &'static str {
        match self {
            ReloadTrigger::Signal => "signal",
            ReloadTrigger::FileChanged => "file_changed",
        }
    }
}

pub struct ConfigReloader {
    store: Arc<ConfigStore>,
    interval: Duration,
    triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
}

impl ConfigReloader {
    /// Create a reloader and the sender used to request extra reloads.
    pub fn new(
        store: Arc<ConfigStore>,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedSender<ReloadTrigger>) {
        let (trigger_tx, triggers) = mpsc::unbounded_channel();
        (
            Self {
                store,
                interval,
                triggers,
            },
            trigger_tx,
        )
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            source = %self.store.source().describe(),
            "Config reloader starting"
        );

        let start = first_tick(Instant::now(), self.interval);
        let mut ticker = time::interval_at(start, self.interval);
        let mut triggers_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reload_once("interval").await;
                }
                trigger = self.triggers.recv(), if triggers_open => {
                    match trigger {
                        Some(trigger) => self.reload_once(trigger.as_str()).await,
                        None => triggers_open = false,
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Config reloader received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn reload_once(&self, cause: &'static str) {
        tracing::debug!(cause, "Reloading resource table");
        let store = Arc::clone(&self.store);
        // Failures are logged by the store and leave the old snapshot active.
        if let Err(e) = tokio::task::spawn_blocking(move || store.reload()).await {
            tracing::error!(cause, error = %e, "Reload task panicked");
        }
    }
}

/// One interval from `now`, saturating far in the future instead of
/// overflowing for huge intervals.
fn first_tick(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

/// Roughly thirty years.
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;
