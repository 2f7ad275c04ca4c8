//! Layered daemon settings.
//!
//! Sources, later ones winning:
//! - Default values
//! - TOML settings file (`--config`, else `<config_dir>/page-indexer/settings.toml`)
//! - Environment variables
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PI_` and use double underscores
//! to separate nested levels:
//! - `PI_STATE_DIR=/var/lib/page-indexer` sets `state_dir`
//! - `PI_INDEX__TIMEOUT_SECS=10` sets `index.timeout_secs`
//! - `PI_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "page-indexer";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory for preferences, sync state and log files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// File name of the cluster config expected next to each manifest
    #[serde(default = "default_cluster_config_name")]
    pub cluster_config_name: String,

    /// Search index client settings
    #[serde(default)]
    pub index: IndexSettings,

    /// File watcher settings
    #[serde(default)]
    pub watcher: WatcherSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexSettings {
    /// URL scheme used for bare node addresses
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Port used for nodes listed without one
    #[serde(default = "default_port")]
    pub default_port: u16,

    /// Upper bound for a single upsert request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Document type used when a page has an empty `type`
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatcherSettings {
    /// Capacity of the channel between the OS watcher and a watch loop
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `page_indexer::index = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,

    /// Also write a daily rolling `indexer.log` into the state directory
    #[serde(default = "default_true")]
    pub file: bool,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_cluster_config_name() -> String { "esindexer_config.json".to_string() }
fn default_scheme() -> String { "http".to_string() }
fn default_port() -> u16 { 9300 }
fn default_timeout_secs() -> u64 { 30 }
fn default_doc_type() -> String { "page".to_string() }
fn default_channel_capacity() -> usize { 100 }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            state_dir: None,
            cluster_config_name: default_cluster_config_name(),
            index: IndexSettings::default(),
            watcher: WatcherSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            default_port: default_port(),
            timeout_secs: default_timeout_secs(),
            doc_type: default_doc_type(),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
            file: true,
        }
    }
}

impl Settings {
    /// Load configuration from a specific file (which may not exist).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels
            .merge(Env::prefixed("PI_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// `<config_dir>/page-indexer/settings.toml`, or a local fallback.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from(".page-indexer/settings.toml"))
    }

    /// Effective state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".page-indexer"))
        })
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
