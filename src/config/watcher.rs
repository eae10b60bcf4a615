//! Resource file watcher for immediate reloads.
//!
//! The watcher never loads anything itself; it only asks the reloader for
//! an extra reload so all loads stay on one serialized path.
//!
//! The parent directory is watched rather than the file: editors and
//! deploy tools save by renaming a temp file over the original, which
//! leaves a file-level watch on the old inode.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::reloader::ReloadTrigger;

/// Watches the resource file and forwards change notifications.
pub struct ConfigWatcher {
    path: PathBuf,
    trigger_tx: mpsc::UnboundedSender<ReloadTrigger>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, trigger_tx: mpsc::UnboundedSender<ReloadTrigger>) -> Self {
        Self {
            path: path.to_path_buf(),
            trigger_tx,
        }
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive; dropping it stops watching.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.trigger_tx.clone();
        let file_name = self.path.file_name().map(OsString::from);
        let dir = watched_dir(&self.path);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event, file_name.as_deref()) {
                        tracing::debug!(paths = ?event.paths, "Resource file change detected");
                        let _ = tx.send(ReloadTrigger::FileChanged);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Resource file watcher started");
        Ok(watcher)
    }
}

/// Directory holding the resource file; `.` for a bare file name.
fn watched_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Create, modify (including renames) or remove events naming the resource file.
fn is_relevant(event: &Event, file_name: Option<&OsStr>) -> bool {
    let kind_matches = event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove();
    kind_matches
        && file_name.is_some_and(|name| event.paths.iter().any(|p| p.file_name() == Some(name)))
}
