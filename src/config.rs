//! Configuration module for filerelay.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FILERELAY_` and use double
//! underscores to separate nested levels:
//! - `FILERELAY_WATCH_DIR=/data/incoming` sets `watch_dir`
//! - `FILERELAY_UPLOAD__TIMEOUT_SECS=10` sets `upload.timeout_secs`
//! - `FILERELAY_STABILITY__SETTLE_DELAY_MS=500` sets `stability.settle_delay_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the settings file.
pub const CONFIG_DIR: &str = ".filerelay";
/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "FILERELAY_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Folder to watch (non-recursive)
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,

    /// Upload endpoint settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// Completion detection timing
    #[serde(default)]
    pub stability: StabilityConfig,

    /// Log sinks and levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    /// Endpoint receiving the multipart POST
    #[serde(default = "default_upload_url")]
    pub url: String,

    /// Multipart field carrying the file
    #[serde(default = "default_field_name")]
    pub field_name: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StabilityConfig {
    /// Wait after a creation event before uploading
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause between the two size reads on a modification event
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Global level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Persistent log file (appended)
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    /// Per-target overrides, e.g. `filerelay = "debug"`
    #[serde(default = "default_log_modules")]
    pub modules: BTreeMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_watch_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}
fn default_upload_url() -> String {
    "https://otlglcc10g.execute-api.ap-south-1.amazonaws.com/api/statements/upload".to_string()
}
fn default_field_name() -> String {
    "file".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_settle_delay_ms() -> u64 {
    2000
}
fn default_probe_interval_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_modules() -> BTreeMap<String, String> {
    BTreeMap::from([("filerelay".to_string(), "info".to_string())])
}
fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("filerelay.log"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            watch_dir: default_watch_dir(),
            upload: UploadConfig::default(),
            stability: StabilityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: default_upload_url(),
            field_name: default_field_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            probe_interval_ms: default_probe_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            file: default_log_file(),
            modules: default_log_modules(),
        }
    }
}

impl UploadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StabilityConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace config by looking for .filerelay directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels,
            // single underscore remains as is within field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for a .filerelay directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create a default settings file under `root`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
