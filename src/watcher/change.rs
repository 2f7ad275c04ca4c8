//! Watch loop binding one manifest file to its synchronizer.

use std::ffi::OsString;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use super::error::WatchError;
use super::source::EventSource;
use crate::sync::Synchronizer;

/// Lifecycle of a [`ChangeWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    WaitingForEvent,
    Firing,
    Stopped,
}

/// Counters for one watch loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub batches: usize,
    /// Events matching the manifest file.
    pub events: usize,
    /// Synchronizer runs that completed.
    pub runs: usize,
    /// Synchronizer runs that aborted.
    pub failed_runs: usize,
}

/// Turns modification events in a manifest's directory into sync runs.
pub struct ChangeWatcher<S: EventSource> {
    file_name: OsString,
    source: S,
    synchronizer: Synchronizer,
    state: WatcherState,
}

impl<S: EventSource> ChangeWatcher<S> {
    pub fn new(source: S, synchronizer: Synchronizer) -> Result<Self, WatchError> {
        let file_name = synchronizer
            .manifest()
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| WatchError::NoFileName {
                manifest: synchronizer.manifest().to_path_buf(),
            })?;

        Ok(Self {
            file_name,
            source,
            synchronizer,
            state: WatcherState::Idle,
        })
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name() == Some(self.file_name.as_os_str())
    }

    /// Run until `cancel` fires or the source fails.
    ///
    /// Every matching event triggers one synchronizer run. A failed run is
    /// logged and the loop keeps waiting. Cancellation also interrupts a run
    /// in progress; records pushed but not yet committed are pushed again
    /// on the next run.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<WatchSummary, WatchError> {
        let mut summary = WatchSummary::default();
        let manifest = self.synchronizer.manifest().to_path_buf();
        crate::log_event!("watcher", "started", "{}", manifest.display());

        let result = 'watch: loop {
            self.state = WatcherState::WaitingForEvent;

            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'watch Ok(()),
                batch = self.source.next_batch() => batch,
            };
            let Some(batch) = batch else {
                break 'watch Err(WatchError::ChannelClosed);
            };
            summary.batches += 1;

            for path in &batch {
                if !self.matches(path) {
                    crate::debug_event!("watcher", "unmatched", "{}", path.display());
                    continue;
                }

                self.state = WatcherState::Firing;
                summary.events += 1;
                let run = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        crate::log_event!("watcher", "interrupted", "{}", manifest.display());
                        break 'watch Ok(());
                    }
                    run = self.synchronizer.run() => run,
                };
                match run {
                    Ok(report) => {
                        summary.runs += 1;
                        crate::log_event!("sync", "finished", "{}: {report}", manifest.display());
                    }
                    Err(e) => {
                        summary.failed_runs += 1;
                        tracing::error!("[sync] {} failed: {e}", manifest.display());
                    }
                }
            }

            if let Err(e) = self.source.rearm() {
                break 'watch Err(e);
            }
            self.state = WatcherState::Idle;
        };

        self.state = WatcherState::Stopped;
        match result {
            Ok(()) => {
                crate::log_event!("watcher", "stopped", "{}", manifest.display());
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("[watcher] {} stopped: {e}", manifest.display());
                Err(e)
            }
        }
    }
}
