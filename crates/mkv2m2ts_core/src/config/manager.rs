//! Config loading.
//!
//! The converter only reads its settings; a missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::Settings;

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads application configuration from a TOML file.
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_default()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Consume the manager, returning the loaded settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Load config from file.
    ///
    /// Returns error if file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path).map_err(|source| {
            ConfigError::ReadError {
                path: self.config_path.clone(),
                source,
            }
        })?;
        self.settings = parse_settings(&content).map_err(|source| ConfigError::ParseError {
            path: self.config_path.clone(),
            source,
        })?;

        tracing::debug!("Loaded config from {}", self.config_path.display());
        Ok(())
    }

    /// Load config from file, keeping defaults if it doesn't exist.
    pub fn load_or_default(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            tracing::debug!(
                "No config at {}, using defaults",
                self.config_path.display()
            );
            self.settings = Settings::default();
            return Ok(());
        }
        self.load()
    }
}

/// Parse settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));

        manager.load_or_default().unwrap();
        assert_eq!(manager.settings(), &Settings::default());

        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn loads_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mkv2m2ts.toml");
        fs::write(&path, "[audio]\nac3_bitrate_kbps = 448\n").unwrap();

        let mut manager = ConfigManager::new(&path);
        manager.load().unwrap();
        assert_eq!(manager.settings().audio.ac3_bitrate_kbps, 448);
        assert_eq!(manager.path(), path.as_path());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[audio\nac3_bitrate_kbps = \"lots\"").unwrap();

        let mut manager = ConfigManager::new(&path);
        assert!(matches!(
            manager.load_or_default(),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
