//! Sync command - one synchronizer run without watching.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};

use super::manifests::load_preferences;
use super::resolve_manifest;
use crate::config::Settings;
use crate::index::{HttpConnector, IndexConnector};
use crate::sync::{RunReport, Synchronizer};

/// Synchronize one registered manifest using `connector`.
pub async fn sync_once(
    settings: &Settings,
    manifest: &Path,
    connector: Arc<dyn IndexConnector>,
) -> anyhow::Result<RunReport> {
    let manifest = resolve_manifest(manifest)?;
    let prefs = load_preferences(&settings.state_dir())?;
    if !prefs.contains(&manifest) {
        bail!(
            "Manifest {} is not registered. Add it with: page-indexer add {}",
            manifest.display(),
            manifest.display()
        );
    }

    let store = prefs.state_store(&manifest);
    let mut synchronizer = Synchronizer::open(&manifest, settings, Box::new(store), connector)
        .with_context(|| format!("Cannot prepare {}", manifest.display()))?;

    let report = synchronizer
        .run()
        .await
        .with_context(|| format!("Synchronizing {} failed", manifest.display()))?;
    Ok(report)
}

/// Run sync command.
pub async fn run(settings: &Settings, manifest: &Path) -> anyhow::Result<()> {
    let connector = Arc::new(HttpConnector::from_settings(&settings.index));
    let report = sync_once(settings, manifest, connector).await?;

    println!("{}: {report}", manifest.display());
    if report.failed > 0 || report.uncommitted > 0 {
        bail!(
            "{} page(s) were not synchronized and will be retried",
            report.failed + report.uncommitted
        );
    }
    Ok(())
}
