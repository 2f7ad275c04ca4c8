//! Manifest watching.
//!
//! # Architecture
//!
//! ```text
//! WatcherSupervisor
//!   one task per manifest, no shared state
//!         |
//!    ChangeWatcher  (Idle -> WaitingForEvent -> Firing -> Idle, Stopped)
//!         |  batch of modified paths, filtered by file name
//!    Synchronizer::run
//!         |
//!    EventSource::rearm  (checked after every batch)
//! ```

mod change;
mod error;
mod source;
mod supervisor;

pub use change::{ChangeWatcher, WatchSummary, WatcherState};
pub use error::WatchError;
pub use source::{EventSource, NotifySource};
pub use supervisor::{StartError, SupervisorReport, WatcherSupervisor};
