//! Manifest synchronization: diff a manifest against sync state and push
//! the pages that changed.
//!
//! Per record, in manifest order:
//!
//! ```text
//! lookup url in SyncState
//!   absent, or manifest.modified > stored.modified  -> upsert
//!   otherwise                                       -> skip
//! upsert ok     -> commit record to SyncState (persisted)
//! upsert failed -> leave SyncState alone, continue with next record
//! ```
//!
//! A failed push is retried on the next run because the state still shows
//! the page as missing or stale. A crash between a confirmed upsert and the
//! commit causes one repeated upsert, which the index absorbs because
//! documents are keyed by URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::cluster::{ClusterConfig, ConfigError};
use crate::config::Settings;
use crate::index::{IndexClient, IndexConnector, IndexError, UpsertOutcome, document_body};
use crate::manifest::{Page, ParseError, read_manifest};
use crate::storage::{PersistenceError, StateStore, SyncState};

/// Errors that abort a whole run. Per-record failures never do.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Cannot connect to cluster: {0}")]
    Connect(#[source] IndexError),
}

/// Errors preparing a synchronizer for a manifest.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot load sync state: {0}")]
    State(#[from] PersistenceError),
}

/// What one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records in the manifest.
    pub records: usize,
    /// Records already in sync.
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    /// Records whose upsert failed; retried next run.
    pub failed: usize,
    /// Records pushed but not durably committed.
    pub uncommitted: usize,
}

impl RunReport {
    /// Records the index accepted.
    pub fn pushed(&self) -> usize {
        self.created + self.updated
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records, {} created, {} updated, {} unchanged, {} failed",
            self.records, self.created, self.updated, self.skipped, self.failed
        )?;
        if self.uncommitted > 0 {
            write!(f, ", {} not persisted", self.uncommitted)?;
        }
        Ok(())
    }
}

/// Keeps one manifest's pages in sync with one index.
pub struct Synchronizer {
    manifest: PathBuf,
    cluster: ClusterConfig,
    state: SyncState,
    connector: Arc<dyn IndexConnector>,
    default_doc_type: String,
}

impl Synchronizer {
    pub fn new(
        manifest: PathBuf,
        cluster: ClusterConfig,
        state: SyncState,
        connector: Arc<dyn IndexConnector>,
    ) -> Self {
        Self {
            manifest,
            cluster,
            state,
            connector,
            default_doc_type: crate::config::IndexSettings::default().doc_type,
        }
    }

    /// Document type for pages whose `type` is empty.
    pub fn with_default_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.default_doc_type = doc_type.into();
        self
    }

    /// Load the manifest's cluster config and state from `settings`.
    pub fn open(
        manifest: &Path,
        settings: &Settings,
        store: Box<dyn StateStore>,
        connector: Arc<dyn IndexConnector>,
    ) -> Result<Self, OpenError> {
        let cluster = ClusterConfig::load_for_manifest(manifest, &settings.cluster_config_name)?;
        let state = SyncState::load(store)?;

        crate::debug_event!(
            "sync",
            "opened",
            "{} -> index {} ({} pages synced)",
            manifest.display(),
            cluster.index,
            state.len()
        );

        Ok(Self::new(manifest.to_path_buf(), cluster, state, connector)
            .with_default_doc_type(settings.index.doc_type.clone()))
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Read the manifest and push every new or modified page.
    ///
    /// A client is acquired on the first page that needs pushing and
    /// released when the run returns.
    pub async fn run(&mut self) -> Result<RunReport, SyncError> {
        let pages = read_manifest(&self.manifest)?;
        let mut report = RunReport {
            records: pages.len(),
            ..RunReport::default()
        };

        let mut client: Option<Box<dyn IndexClient>> = None;

        for page in pages {
            if !self.state.needs_update(&page) {
                report.skipped += 1;
                continue;
            }

            let active = match client.take() {
                Some(active) => active,
                None => self
                    .connector
                    .connect(&self.cluster)
                    .map_err(SyncError::Connect)?,
            };
            self.push(active.as_ref(), page, &mut report).await;
            client = Some(active);
        }

        if client.is_some() {
            crate::debug_event!("sync", "released", "{}", self.cluster.index);
        }
        Ok(report)
    }

    async fn push(&mut self, client: &dyn IndexClient, page: Page, report: &mut RunReport) {
        let body = match document_body(&page) {
            Ok(body) => body,
            Err(e) => {
                report.failed += 1;
                tracing::error!("[sync] {e}");
                return;
            }
        };
        crate::debug_event!("sync", "payload", "{body}");

        let doc_type = if page.page_type.is_empty() {
            self.default_doc_type.as_str()
        } else {
            page.page_type.as_str()
        };

        match client
            .upsert(&self.cluster.index, doc_type, &page.url, &body)
            .await
        {
            Ok(outcome) => {
                match outcome {
                    UpsertOutcome::Created => report.created += 1,
                    UpsertOutcome::Updated => report.updated += 1,
                }
                crate::log_event!("sync", outcome.as_str(), "{}", page.url);

                let url = page.url.clone();
                if let Err(e) = self.state.commit(page) {
                    report.uncommitted += 1;
                    tracing::error!("[sync] pushed {url} but could not persist state: {e}");
                }
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!("[sync] upsert failed for {}: {e}", page.url);
            }
        }
    }
}
