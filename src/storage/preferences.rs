//! Application preferences: the set of supervised manifests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{PersistenceError, PersistenceResult};
use super::state::JsonStateStore;

const PREFERENCES_FILE: &str = "preferences.json";

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    manifests: Vec<PathBuf>,
}

/// Persisted preferences rooted at a state directory.
#[derive(Debug, Clone)]
pub struct Preferences {
    state_dir: PathBuf,
    data: PreferencesFile,
}

impl Preferences {
    /// Load preferences from `state_dir`.
    ///
    /// A missing file means a fresh install. An unreadable or corrupt file
    /// is an error; callers treat it as fatal.
    pub fn load(state_dir: &Path) -> PersistenceResult<Self> {
        let path = state_dir.join(PREFERENCES_FILE);
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&content)
                .map_err(|source| PersistenceError::Corrupt { path, source })?
        } else {
            PreferencesFile {
                version: default_version(),
                manifests: Vec::new(),
            }
        };

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            data,
        })
    }

    /// Persist preferences.
    pub fn save(&self) -> PersistenceResult<()> {
        super::write_json_atomic(&self.state_dir.join(PREFERENCES_FILE), &self.data)
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Registered manifests in registration order.
    pub fn manifests(&self) -> &[PathBuf] {
        &self.data.manifests
    }

    pub fn contains(&self, manifest: &Path) -> bool {
        self.data.manifests.iter().any(|m| m == manifest)
    }

    /// Register a manifest. Returns false if it was already registered.
    pub fn add_manifest(&mut self, manifest: PathBuf) -> bool {
        if self.contains(&manifest) {
            return false;
        }
        self.data.manifests.push(manifest);
        true
    }

    /// Unregister a manifest. Its sync state file is left in place.
    pub fn remove_manifest(&mut self, manifest: &Path) -> bool {
        let before = self.data.manifests.len();
        self.data.manifests.retain(|m| m != manifest);
        self.data.manifests.len() != before
    }

    /// State store for one registered manifest.
    pub fn state_store(&self, manifest: &Path) -> JsonStateStore {
        JsonStateStore::for_manifest(&self.state_dir, manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = Preferences::load(temp_dir.path()).unwrap();
        assert!(prefs.manifests().is_empty());
    }

    #[test]
    fn test_add_is_deduplicated_and_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(temp_dir.path()).unwrap();

        assert!(prefs.add_manifest(PathBuf::from("/site/pages.json")));
        assert!(!prefs.add_manifest(PathBuf::from("/site/pages.json")));
        assert!(prefs.add_manifest(PathBuf::from("/blog/pages.json")));
        prefs.save().unwrap();

        let reloaded = Preferences::load(temp_dir.path()).unwrap();
        assert_eq!(
            reloaded.manifests(),
            &[
                PathBuf::from("/site/pages.json"),
                PathBuf::from("/blog/pages.json")
            ]
        );
    }

    #[test]
    fn test_remove_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(temp_dir.path()).unwrap();
        prefs.add_manifest(PathBuf::from("/site/pages.json"));

        assert!(prefs.remove_manifest(Path::new("/site/pages.json")));
        assert!(!prefs.remove_manifest(Path::new("/site/pages.json")));
        assert!(prefs.manifests().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(PREFERENCES_FILE), "[1, 2").unwrap();

        let err = Preferences::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
    }
}
