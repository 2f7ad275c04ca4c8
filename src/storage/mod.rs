//! Durable local state: registered manifests and per-manifest sync state.
//!
//! Layout under the state directory:
//!
//! ```text
//! preferences.json          registered manifests
//! state/<sha256>.json       one SyncState per manifest
//! indexer.log.YYYY-MM-DD    daily log files (when file logging is on)
//! ```

mod error;
mod preferences;
mod state;

pub use error::{PersistenceError, PersistenceResult};
pub use preferences::Preferences;
pub use state::{JsonStateStore, MemoryStateStore, StateStore, SyncState};

use std::io::Write;
use std::path::Path;

use serde::Serialize;

/// Write `value` as pretty JSON, replacing `path` atomically.
///
/// The temp file lives in the target directory so the final rename never
/// crosses filesystems.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> PersistenceResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|source| PersistenceError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.flush().map_err(|source| PersistenceError::Io {
        path: tmp.path().to_path_buf(),
        source,
    })?;
    // Contents must be on disk before the rename makes them visible
    tmp.as_file().sync_all().map_err(|source| PersistenceError::Io {
        path: tmp.path().to_path_buf(),
        source,
    })?;

    tmp.persist(path).map_err(|e| PersistenceError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
