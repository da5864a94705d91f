//! Viewer configuration stored as RON in the user's config directory.

use crate::Category;
use crate::panel::ViewportSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "svviz-view";
const CONFIG_FILE: &str = "config.ron";

/// Errors that can occur when loading or saving the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        source: ron::de::SpannedError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to write config '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the svviz backend
    pub server: String,
    /// Delay between status polls
    pub poll_interval_ms: u64,
    /// Categories fetched once rendering is done, in tab order
    pub categories: Vec<Category>,
    pub viewport: ViewportSettings,
    /// Where exported SVG/PNG files go; defaults to the download directory
    pub export_dir: Option<PathBuf>,
    /// Optional timeout for every backend request; requests never time out when unset
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:5000".to_string(),
            poll_interval_ms: 100,
            categories: Category::ALL.to_vec(),
            viewport: ViewportSettings::default(),
            export_dir: None,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/svviz-view/config.ron`.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the configuration from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn override_with(&mut self, server: Option<String>, poll_interval_ms: Option<u64>) {
        if let Some(server) = server {
            self.server = server;
        }
        if let Some(interval) = poll_interval_ms {
            self.poll_interval_ms = interval;
        }
    }

    /// Writes the configuration as pretty RON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }

        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Export directory, falling back to the download directory and then the working directory.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("missing.ron"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = ron::from_str(
            r#"(server: "http://localhost:8123", categories: [alt, amb], viewport: (horizontal_margin: 150.0))"#,
        )
        .unwrap();

        assert_eq!(config.server, "http://localhost:8123");
        assert_eq!(config.categories, vec![Category::Alt, Category::Amb]);
        assert_eq!(config.viewport.horizontal_margin, 150.0);
        assert_eq!(config.viewport.pane_gutter, 12.0);
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svviz-view").join("saved.ron");
        let config = Config {
            poll_interval_ms: 250,
            request_timeout_secs: Some(30),
            ..Config::default()
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(server: 12").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn overrides_are_saved_with_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");

        let mut config = Config {
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        config.override_with(Some("http://svviz.local:8000".into()), None);
        assert_eq!(config.poll_interval_ms, 100);

        config.save(&path).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.server, "http://svviz.local:8000");
        assert_eq!(loaded.request_timeout_secs, Some(5));
    }
}
