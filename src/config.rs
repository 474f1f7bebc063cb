use crate::core::{BrowserError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration structure parsed from a TOML file.
///
/// Every section and field is optional; the defaults reproduce the
/// behavior of a browser reading `Databases/<name>.db` in WAL mode.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub sqlite: SqliteConfig,
    pub browser: BrowserConfig,
}

/// Where database files live and how they are named.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub directory: PathBuf,
    pub extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            directory: PathBuf::from("Databases"),
            extension: "db".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolves `<directory>/<name>.<extension>`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", name, self.extension))
    }
}

/// How connections are acquired for each unit of work.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPolicy {
    /// Open a fresh connection for every operation and close it afterwards
    #[default]
    PerCall,
    /// Keep the connection made by `open` until `close` or `switch`
    LongLived,
}

/// SQLite-related configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SqliteConfig {
    pub journal_mode: String,
    pub synchronous: Option<String>,
    pub busy_timeout_ms: u64,
    pub connection_policy: ConnectionPolicy,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfig {
            journal_mode: "WAL".to_string(),
            synchronous: None,
            busy_timeout_ms: 5000,
            connection_policy: ConnectionPolicy::PerCall,
        }
    }
}

impl SqliteConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Sentinels exchanged with the UI layer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserConfig {
    /// Database selection meaning "nothing picked yet"
    pub no_selection: String,
    /// Table selection meaning "nothing picked yet"
    pub no_table_selection: String,
    /// Legacy text returned by point lookups that miss
    pub not_found: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            no_selection: "Select database".to_string(),
            no_table_selection: "Select table".to_string(),
            not_found: "Not Found".to_string(),
        }
    }
}

const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
const SYNCHRONOUS_MODES: &[&str] = &["OFF", "NORMAL", "FULL", "EXTRA", "0", "1", "2", "3"];

impl Config {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| BrowserError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects pragma values SQLite would not accept.
    ///
    /// Pragma arguments cannot be bound as parameters, so they are checked
    /// against the known keyword set here instead.
    pub fn validate(&self) -> Result<()> {
        let journal = self.sqlite.journal_mode.to_uppercase();
        if !JOURNAL_MODES.contains(&journal.as_str()) {
            return Err(BrowserError::Config(format!(
                "Unsupported journal_mode '{}'",
                self.sqlite.journal_mode
            )));
        }
        if let Some(sync) = &self.sqlite.synchronous {
            if !SYNCHRONOUS_MODES.contains(&sync.to_uppercase().as_str()) {
                return Err(BrowserError::Config(format!(
                    "Unsupported synchronous mode '{}'",
                    sync
                )));
            }
        }
        if self.storage.extension.is_empty() || self.storage.extension.contains(['/', '\\', '.']) {
            return Err(BrowserError::Config(format!(
                "Invalid database file extension '{}'",
                self.storage.extension
            )));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file at the given path.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| BrowserError::Config(format!("{}: {}", path.display(), e)))?;
    Config::from_toml_str(&content)
}

/// The per-user configuration file, `<config_dir>/tablebrowser/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tablebrowser").join("config.toml"))
}

/// Loads the explicit file if given, else the per-user file if it exists,
/// else the defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(path),
        _ => Ok(Config::default()),
    }
}
