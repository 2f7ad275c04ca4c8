//! Runs one isolated watch unit per registered manifest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::change::{ChangeWatcher, WatchSummary};
use super::error::WatchError;
use super::source::NotifySource;
use crate::config::Settings;
use crate::index::IndexConnector;
use crate::storage::JsonStateStore;
use crate::sync::{OpenError, Synchronizer};

/// Why a manifest could not be put under watch.
#[derive(Error, Debug)]
pub enum StartError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Outcome of a supervised session.
#[derive(Debug, Default)]
pub struct SupervisorReport {
    pub started: usize,
    /// Manifests that could not be started.
    pub skipped: Vec<PathBuf>,
    /// Units that ended with an error instead of a clean stop.
    pub failed: usize,
}

pub struct WatcherSupervisor {
    settings: Settings,
    state_dir: PathBuf,
    connector: Arc<dyn IndexConnector>,
}

impl WatcherSupervisor {
    pub fn new(settings: Settings, state_dir: PathBuf, connector: Arc<dyn IndexConnector>) -> Self {
        Self {
            settings,
            state_dir,
            connector,
        }
    }

    /// Build the watch unit for one manifest.
    ///
    /// Each unit owns its cluster config, sync state file and event source.
    pub fn start_unit(&self, manifest: &Path) -> Result<ChangeWatcher<NotifySource>, StartError> {
        let store = JsonStateStore::for_manifest(&self.state_dir, manifest);
        let synchronizer =
            Synchronizer::open(manifest, &self.settings, Box::new(store), self.connector.clone())?;

        let dir = match manifest.parent() {
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => {
                return Err(WatchError::NoParent {
                    manifest: manifest.to_path_buf(),
                }
                .into());
            }
        };
        let source = NotifySource::new(dir, self.settings.watcher.channel_capacity)?;

        Ok(ChangeWatcher::new(source, synchronizer)?)
    }

    /// Watch every manifest until `cancel` fires.
    ///
    /// A manifest that fails to start is logged and skipped. Returns
    /// [`WatchError::NoWatchers`] when none could be started.
    pub async fn run(
        &self,
        manifests: &[PathBuf],
        cancel: CancellationToken,
    ) -> Result<SupervisorReport, WatchError> {
        let mut report = SupervisorReport::default();
        let mut units: Vec<(PathBuf, JoinHandle<Result<WatchSummary, WatchError>>)> = Vec::new();

        for manifest in manifests {
            let mut watcher = match self.start_unit(manifest) {
                Ok(watcher) => watcher,
                Err(e) => {
                    tracing::error!("[supervisor] skipping {}: {e}", manifest.display());
                    report.skipped.push(manifest.clone());
                    continue;
                }
            };

            let token = cancel.child_token();
            let handle = tokio::spawn(async move { watcher.run(token).await });
            units.push((manifest.clone(), handle));
        }

        report.started = units.len();
        if units.is_empty() {
            return Err(WatchError::NoWatchers);
        }
        crate::log_event!(
            "supervisor",
            "running",
            "{} manifest(s), {} skipped",
            report.started,
            report.skipped.len()
        );

        for (manifest, handle) in units {
            match handle.await {
                Ok(Ok(summary)) => {
                    crate::debug_event!(
                        "supervisor",
                        "unit finished",
                        "{}: {} runs from {} events",
                        manifest.display(),
                        summary.runs,
                        summary.events
                    );
                }
                Ok(Err(_)) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("[supervisor] unit for {} panicked: {e}", manifest.display());
                }
            }
        }

        Ok(report)
    }
}
