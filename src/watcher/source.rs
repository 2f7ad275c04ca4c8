//! Filesystem event sources feeding a [`ChangeWatcher`](super::ChangeWatcher).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::WatchError;

/// A stream of modification batches for one directory.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next batch of modified paths.
    ///
    /// Everything already queued is drained into the same batch. Returns
    /// `None` once the source can never produce events again.
    async fn next_batch(&mut self) -> Option<Vec<PathBuf>>;

    /// Make sure the source keeps delivering events after a batch.
    fn rearm(&mut self) -> Result<(), WatchError>;
}

/// [`EventSource`] backed by the platform's recommended `notify` watcher.
///
/// Watches one directory non-recursively and reports modify events only.
pub struct NotifySource {
    dir: PathBuf,
    watcher: RecommendedWatcher,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    needs_rewatch: bool,
}

impl NotifySource {
    /// Start watching `dir`.
    pub fn new(dir: &Path, capacity: usize) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "watching", "{}", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            watcher,
            event_rx: rx,
            needs_rewatch: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn absorb(&mut self, res: notify::Result<Event>, batch: &mut Vec<PathBuf>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("[watcher] file watch error on {}: {e}", self.dir.display());
                self.needs_rewatch = true;
                return;
            }
        };

        if event.need_rescan() {
            self.needs_rewatch = true;
        }

        match event.kind {
            EventKind::Modify(_) => batch.extend(event.paths),
            EventKind::Remove(_) if event.paths.iter().any(|p| p == &self.dir) => {
                self.needs_rewatch = true;
            }
            _ => {}
        }
    }
}

#[async_trait]
impl EventSource for NotifySource {
    async fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        let first = self.event_rx.recv().await?;
        let mut batch = Vec::new();
        self.absorb(first, &mut batch);

        while let Ok(res) = self.event_rx.try_recv() {
            self.absorb(res, &mut batch);
        }
        Some(batch)
    }

    fn rearm(&mut self) -> Result<(), WatchError> {
        if !self.needs_rewatch {
            return Ok(());
        }

        let _ = self.watcher.unwatch(&self.dir);
        self.watcher
            .watch(&self.dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Rearm {
                path: self.dir.clone(),
                reason: e.to_string(),
            })?;
        self.needs_rewatch = false;
        crate::debug_event!("watcher", "re-armed", "{}", self.dir.display());
        Ok(())
    }
}
