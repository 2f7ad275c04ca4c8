//! Error types for manifest watching.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Manifest {manifest} has no parent directory to watch")]
    NoParent { manifest: PathBuf },

    #[error("Manifest path {manifest} does not name a file")]
    NoFileName { manifest: PathBuf },

    #[error("Failed to re-arm watch on {path}: {reason}")]
    Rearm { path: PathBuf, reason: String },

    #[error("No manifest could be watched")]
    NoWatchers,

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
