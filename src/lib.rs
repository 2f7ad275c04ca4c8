//! Incremental synchronization of page manifests into a search index.
//!
//! A manifest is a JSON array of page records written by a static site
//! generator. Each registered manifest is watched; whenever it changes, the
//! pages that are new or newer than the last pushed version are upserted into
//! the index named by the manifest's sibling cluster config.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod index;
pub mod logging;
pub mod manifest;
pub mod storage;
pub mod sync;
pub mod watcher;

pub use cluster::{ClusterConfig, ConfigError};
pub use config::Settings;
pub use index::{HttpConnector, IndexClient, IndexConnector, IndexError, UpsertOutcome};
pub use manifest::{Page, ParseError};
pub use storage::{PersistenceError, Preferences, StateStore, SyncState};
pub use sync::{RunReport, SyncError, Synchronizer};
pub use watcher::{ChangeWatcher, EventSource, WatchError, WatcherSupervisor};
