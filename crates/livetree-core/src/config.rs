//! Configuration management for livetree.
//!
//! Loads configuration from ${LIVETREE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::snapshot::CopyFormat;

/// How the keys of an object are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One key per row (default)
    #[default]
    Rows,
    /// Keys side by side, sharing the width equally
    Columns,
}

impl Layout {
    /// Returns true when siblings are stacked.
    pub fn is_stacked(self) -> bool {
        matches!(self, Layout::Rows)
    }
}

impl std::str::FromStr for Layout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rows" => Ok(Layout::Rows),
            "columns" => Ok(Layout::Columns),
            other => anyhow::bail!("Unknown layout '{other}' (expected 'rows' or 'columns')"),
        }
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for livetree configuration and data directories.
    //!
    //! LIVETREE_HOME resolution order:
    //! 1. LIVETREE_HOME environment variable (if set)
    //! 2. ~/.config/livetree (default)
    //! 3. ./.livetree when no home directory is known

    use std::path::PathBuf;

    /// Returns the livetree home directory.
    pub fn livetree_home() -> PathBuf {
        if let Ok(home) = std::env::var("LIVETREE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".livetree"),
            |h| h.join(".config").join("livetree"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        livetree_home().join("config.toml")
    }

    /// Returns the directory holding rolling log files.
    pub fn logs_dir() -> PathBuf {
        livetree_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint polled for snapshots
    pub feed_url: String,
    /// Address descriptor endpoint; `None` means `/getServerIp` on the feed origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_url: Option<String>,
    pub poll_interval_ms: u64,
    pub retry_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub layout: Layout,
    /// Initial collapsed default of the main view
    pub collapsed: bool,
    /// Initial raw default of the main view
    pub raw: bool,
    pub copy_format: CopyFormat,
    /// Main-view scroll offset (lines) at which the favorites panel docks
    pub favorites_dock_after: u16,
    /// Fallback filter when LIVETREE_LOG is unset
    pub log_level: String,
}

impl Config {
    pub const DEFAULT_FEED_URL: &str = "http://127.0.0.1:8080/json";
    const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
    const DEFAULT_RETRY_INTERVAL_MS: u64 = 5000;
    const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;
    const DEFAULT_LOG_LEVEL: &str = "info";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: Self::DEFAULT_FEED_URL.to_string(),
            address_url: None,
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            retry_interval_ms: Self::DEFAULT_RETRY_INTERVAL_MS,
            request_timeout_ms: Self::DEFAULT_REQUEST_TIMEOUT_MS,
            layout: Layout::default(),
            collapsed: false,
            raw: false,
            copy_format: CopyFormat::default(),
            favorites_dock_after: 0,
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.retry_interval(), Duration::from_millis(5000));
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "feed_url = \"http://10.0.0.5:9000/state\"\nlayout = \"columns\"\ncopy_format = \"yaml\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.feed_url, "http://10.0.0.5:9000/state");
        assert_eq!(config.layout, Layout::Columns);
        assert_eq!(config.copy_format, CopyFormat::Yaml);
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(!config.collapsed);
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "layout = \"diagonal\"\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "poll_interval_ms = 250\n").unwrap();

        let err = Config::init(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "poll_interval_ms = 250\n"
        );
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("Rows".parse::<Layout>().unwrap(), Layout::Rows);
        assert_eq!("columns".parse::<Layout>().unwrap(), Layout::Columns);
        assert!("grid".parse::<Layout>().is_err());
        assert!(Layout::Rows.is_stacked());
    }
}
