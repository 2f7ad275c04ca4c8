//! Watch command - supervise every registered manifest until interrupted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;

use super::manifests::load_preferences;
use super::resolve_manifest;
use crate::config::Settings;
use crate::index::HttpConnector;
use crate::watcher::WatcherSupervisor;

/// Run watch command.
///
/// A manifest argument is validated and registered first; an invalid one
/// aborts before anything is watched.
pub async fn run(settings: Settings, manifest: Option<&Path>) -> anyhow::Result<()> {
    let state_dir = settings.state_dir();
    let manifests = registered_manifests(&state_dir, manifest)?;
    if manifests.is_empty() {
        bail!("No manifests registered. Pass one: page-indexer <MANIFEST>");
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => crate::log_event!("watch", "shutdown requested"),
            Err(e) => tracing::error!("[watch] cannot listen for ctrl+c: {e}"),
        }
        signal_token.cancel();
    });

    let connector = Arc::new(HttpConnector::from_settings(&settings.index));
    let supervisor = WatcherSupervisor::new(settings, state_dir, connector);
    let report = supervisor.run(&manifests, cancel).await?;

    crate::log_event!(
        "watch",
        "stopped",
        "{} watched, {} skipped, {} failed",
        report.started,
        report.skipped.len(),
        report.failed
    );
    Ok(())
}

/// Register `manifest` if given, then return every registered manifest.
fn registered_manifests(state_dir: &Path, manifest: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
    let manifest = manifest.map(resolve_manifest).transpose()?;
    let mut prefs = load_preferences(state_dir)?;

    if let Some(manifest) = manifest {
        if prefs.add_manifest(manifest.clone()) {
            prefs.save().context("Cannot save preferences")?;
            crate::log_event!("watch", "registered", "{}", manifest.display());
        }
    }
    Ok(prefs.manifests().to_vec())
}
