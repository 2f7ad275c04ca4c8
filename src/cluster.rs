//! Cluster connection settings stored next to each manifest.
//!
//! The file is JSON:
//!
//! ```json
//! { "generator": "site-builder", "index": "pages", "nodes": ["es1", "es2:9301"] }
//! ```
//!
//! It is loaded once before a manifest's pipeline starts and never reloaded
//! while that pipeline runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a manifest's cluster configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Manifest {manifest} has no parent directory")]
    NoParent { manifest: PathBuf },

    #[error("Cannot read cluster config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed cluster config {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid cluster config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Where and how to push a manifest's pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Name of the tool that produced the manifest, informational only.
    #[serde(default)]
    pub generator: Option<String>,

    /// Target index name.
    pub index: String,

    /// Cluster node addresses, `host` or `host:port`.
    pub nodes: Vec<String>,
}

impl ClusterConfig {
    /// Path of the cluster config file that sits next to `manifest`.
    pub fn sibling_path(manifest: &Path, file_name: &str) -> Result<PathBuf, ConfigError> {
        let parent = manifest.parent().ok_or_else(|| ConfigError::NoParent {
            manifest: manifest.to_path_buf(),
        })?;

        // A bare file name has an empty parent.
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };

        Ok(parent.join(file_name))
    }

    /// Load the cluster config colocated with `manifest`.
    pub fn load_for_manifest(manifest: &Path, file_name: &str) -> Result<Self, ConfigError> {
        Self::load_from(&Self::sibling_path(manifest, file_name)?)
    }

    /// Load and validate a cluster config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: ClusterConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        config.index = config.index.trim().to_string();
        config.nodes = config
            .nodes
            .into_iter()
            .map(|node| node.trim().to_string())
            .filter(|node| !node.is_empty())
            .collect();

        if config.index.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "index name is empty".to_string(),
            });
        }
        if config.nodes.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "no cluster nodes listed".to_string(),
            });
        }

        Ok(config)
    }
}
