//! Per-manifest sync state: the last successfully pushed record for each URL.
//!
//! The in-memory map is owned by exactly one synchronizer. It changes only
//! through [`SyncState::commit`], which the synchronizer calls after the
//! search index confirmed an upsert.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{PersistenceError, PersistenceResult};
use crate::manifest::Page;

/// Backing store for a [`SyncState`].
pub trait StateStore: Send {
    /// Load every committed page, keyed by URL.
    fn load(&self) -> PersistenceResult<HashMap<String, Page>>;

    /// Durably replace the stored pages.
    fn save(&self, pages: &HashMap<String, Page>) -> PersistenceResult<()>;
}

/// On-disk format of a state file.
#[derive(Serialize, Deserialize)]
struct PersistedState {
    manifest: PathBuf,
    pages: BTreeMap<String, Page>,
}

/// JSON file store, one file per manifest.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
    manifest: PathBuf,
}

impl JsonStateStore {
    /// Store for `manifest` under `state_dir/state/`.
    ///
    /// The file name is derived from the manifest path, so two manifests
    /// never share a file.
    pub fn for_manifest(state_dir: &Path, manifest: &Path) -> Self {
        let digest = Sha256::digest(manifest.to_string_lossy().as_bytes());
        let path = state_dir.join("state").join(format!("{digest:x}.json"));
        Self {
            path,
            manifest: manifest.to_path_buf(),
        }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> PersistenceResult<HashMap<String, Page>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let state: PersistedState =
            serde_json::from_str(&content).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(state.pages.into_iter().collect())
    }

    fn save(&self, pages: &HashMap<String, Page>) -> PersistenceResult<()> {
        let state = PersistedState {
            manifest: self.manifest.clone(),
            pages: pages
                .iter()
                .map(|(url, page)| (url.clone(), page.clone()))
                .collect(),
        };
        super::write_json_atomic(&self.path, &state)
    }
}

/// In-memory store. Clones share the same contents.
///
/// Saves can be made to fail on demand, which simulates a crash between a
/// confirmed upsert and the state commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    pages: Arc<Mutex<HashMap<String, Page>>>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of what has been durably saved.
    pub fn saved(&self) -> PersistenceResult<HashMap<String, Page>> {
        self.load()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> PersistenceResult<HashMap<String, Page>> {
        let pages = self
            .pages
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(pages.clone())
    }

    fn save(&self, pages: &HashMap<String, Page>) -> PersistenceResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory store rejecting writes".to_string(),
            ));
        }
        let mut stored = self
            .pages
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        *stored = pages.clone();
        Ok(())
    }
}

/// Mapping from URL to the last record successfully pushed for it.
pub struct SyncState {
    pages: HashMap<String, Page>,
    store: Box<dyn StateStore>,
}

impl std::fmt::Debug for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncState")
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl SyncState {
    /// Load the committed state from `store`.
    ///
    /// A corrupt state file starts the manifest over from empty state: every
    /// page is pushed again, which the index absorbs as updates. The bad file
    /// is replaced on the next commit.
    pub fn load(store: Box<dyn StateStore>) -> PersistenceResult<Self> {
        let pages = match store.load() {
            Ok(pages) => pages,
            Err(PersistenceError::Corrupt { path, source }) => {
                tracing::warn!(
                    "[state] discarding corrupt state file {}: {source}",
                    path.display()
                );
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { pages, store })
    }

    /// Last committed record for `url`.
    pub fn get(&self, url: &str) -> Option<&Page> {
        self.pages.get(url)
    }

    /// Whether `page` must be pushed: it is new, or strictly newer than
    /// the committed record.
    pub fn needs_update(&self, page: &Page) -> bool {
        match self.pages.get(&page.url) {
            Some(existing) => page.is_newer_than(existing),
            None => true,
        }
    }

    /// Record a confirmed push and persist the whole state.
    ///
    /// The in-memory entry is updated even if persisting fails; the caller
    /// gets the error to log. After a restart the page is pushed again.
    pub fn commit(&mut self, page: Page) -> PersistenceResult<()> {
        self.pages.insert(page.url.clone(), page);
        self.store.save(&self.pages)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterate committed pages in no particular order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn page(url: &str, modified: DateTime<Utc>) -> Page {
        Page {
            url: url.to_string(),
            modified,
            title: "Title".to_string(),
            content: "Body".to_string(),
            path: "a.md".to_string(),
            page_type: "post".to_string(),
            categories: vec!["news".to_string()],
            tags: vec!["blog".to_string()],
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_needs_update_rules() {
        let mut state = SyncState::load(Box::new(MemoryStateStore::new())).unwrap();
        assert!(state.needs_update(&page("/a", t(0))));

        state.commit(page("/a", t(10))).unwrap();
        assert!(!state.needs_update(&page("/a", t(5))));
        assert!(!state.needs_update(&page("/a", t(10))));
        assert!(state.needs_update(&page("/a", t(11))));
        assert!(state.needs_update(&page("/b", t(0))));
    }

    #[test]
    fn test_json_store_survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("site/pages.json");
        let store = JsonStateStore::for_manifest(temp_dir.path(), &manifest);

        let mut state = SyncState::load(Box::new(store.clone())).unwrap();
        assert!(state.is_empty());
        state.commit(page("/a", t(0))).unwrap();
        state.commit(page("/b", t(1))).unwrap();
        assert!(store.path().exists());

        let reloaded = SyncState::load(Box::new(store)).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("/a").unwrap().modified, t(0));
        assert_eq!(reloaded.get("/b").unwrap(), &page("/b", t(1)));
    }

    #[test]
    fn test_json_store_is_per_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let a = JsonStateStore::for_manifest(temp_dir.path(), Path::new("/sites/a/pages.json"));
        let b = JsonStateStore::for_manifest(temp_dir.path(), Path::new("/sites/b/pages.json"));
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(temp_dir.path().join("state")));
    }

    #[test]
    fn test_corrupt_state_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStateStore::for_manifest(temp_dir.path(), Path::new("/x/pages.json"));
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
    }

    #[test]
    fn test_truncated_state_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStateStore::for_manifest(temp_dir.path(), Path::new("/x/pages.json"));
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        // What a torn write leaves behind
        std::fs::write(store.path(), "").unwrap();

        let mut state = SyncState::load(Box::new(store.clone())).unwrap();
        assert!(state.is_empty());
        assert!(state.needs_update(&page("/a", t(0))));

        // The next commit replaces the bad file
        state.commit(page("/a", t(0))).unwrap();
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_memory_but_not_store() {
        let store = MemoryStateStore::new();
        let mut state = SyncState::load(Box::new(store.clone())).unwrap();

        store.set_fail_saves(true);
        let err = state.commit(page("/a", t(0))).unwrap_err();
        assert!(matches!(err, PersistenceError::Unavailable(_)));

        assert!(state.get("/a").is_some());
        assert!(store.saved().unwrap().is_empty());
    }
}
