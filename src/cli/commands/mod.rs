//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod config;
pub mod manifests;
pub mod sync;
pub mod watch;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Check a manifest argument and return its canonical path.
///
/// The manifest must exist and be a readable regular file.
pub fn resolve_manifest(path: &Path) -> anyhow::Result<PathBuf> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Manifest {} does not exist", path.display()))?;
    if !metadata.is_file() {
        bail!("Manifest {} is not a regular file", path.display());
    }
    File::open(path).with_context(|| format!("Manifest {} is not readable", path.display()))?;

    path.canonicalize()
        .with_context(|| format!("Cannot resolve manifest path {}", path.display()))
}
