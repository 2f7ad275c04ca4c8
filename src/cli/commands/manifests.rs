//! Manifest registration commands (add, remove, list).

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::resolve_manifest;
use crate::storage::{Preferences, SyncState};

/// Load preferences, treating failure as fatal for the command.
pub fn load_preferences(state_dir: &Path) -> anyhow::Result<Preferences> {
    Preferences::load(state_dir).with_context(|| {
        format!(
            "Cannot load preferences from {}",
            state_dir.display()
        )
    })
}

/// Register a manifest and persist the change.
///
/// Returns the canonical path and whether it was newly added.
pub fn add_manifest(state_dir: &Path, manifest: &Path) -> anyhow::Result<(PathBuf, bool)> {
    let manifest = resolve_manifest(manifest)?;
    let mut prefs = load_preferences(state_dir)?;

    let added = prefs.add_manifest(manifest.clone());
    if added {
        prefs.save().context("Cannot save preferences")?;
        crate::log_event!("manifests", "registered", "{}", manifest.display());
    }
    Ok((manifest, added))
}

/// Unregister a manifest. Works for manifests that no longer exist on disk.
pub fn remove_manifest(state_dir: &Path, manifest: &Path) -> anyhow::Result<bool> {
    let mut prefs = load_preferences(state_dir)?;

    let canonical = manifest.canonicalize().unwrap_or_else(|_| manifest.to_path_buf());
    let removed = prefs.remove_manifest(&canonical) || prefs.remove_manifest(manifest);
    if removed {
        prefs.save().context("Cannot save preferences")?;
        crate::log_event!("manifests", "unregistered", "{}", canonical.display());
    }
    Ok(removed)
}

/// Registered manifests with their synchronized page counts.
///
/// A manifest whose state cannot be read reports `None`.
pub fn list_manifests(state_dir: &Path) -> anyhow::Result<Vec<(PathBuf, Option<usize>)>> {
    let prefs = load_preferences(state_dir)?;

    Ok(prefs
        .manifests()
        .iter()
        .map(|manifest| {
            let store = prefs.state_store(manifest);
            let count = SyncState::load(Box::new(store)).map(|state| state.len()).ok();
            (manifest.clone(), count)
        })
        .collect())
}

/// Run add command.
pub fn run_add(state_dir: &Path, manifest: &Path) -> anyhow::Result<()> {
    let (manifest, added) = add_manifest(state_dir, manifest)?;
    if added {
        println!("Registered manifest: {}", manifest.display());
    } else {
        println!("Manifest already registered: {}", manifest.display());
    }
    Ok(())
}

/// Run remove command.
pub fn run_remove(state_dir: &Path, manifest: &Path) -> anyhow::Result<()> {
    if remove_manifest(state_dir, manifest)? {
        println!("Unregistered manifest: {}", manifest.display());
    } else {
        println!("Manifest was not registered: {}", manifest.display());
    }
    Ok(())
}

/// Run list command.
pub fn run_list(state_dir: &Path) -> anyhow::Result<()> {
    let manifests = list_manifests(state_dir)?;

    println!("Registered manifests:");
    if manifests.is_empty() {
        println!("  (none registered)");
        println!("\nTo add a manifest: page-indexer add <path>");
        return Ok(());
    }
    for (manifest, count) in manifests {
        match count {
            Some(count) => println!("  - {} ({count} pages synced)", manifest.display()),
            None => println!("  - {} (sync state unreadable)", manifest.display()),
        }
    }
    Ok(())
}
