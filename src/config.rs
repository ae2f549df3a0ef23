//! Configuration module for Plume

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::media::CompressOptions;
use crate::paths;
use crate::theme::Theme;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Selected theme
    #[serde(default)]
    pub theme: Theme,

    /// Language tag sent with posts (detected from the environment when unset)
    #[serde(default)]
    pub language: Option<String>,

    /// Images larger than this (in bytes) are recompressed before upload
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    /// Longest allowed image side (in pixels) when recompressing
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,

    /// Delay after the last keystroke before facets are re-detected
    #[serde(default = "default_facet_debounce_ms")]
    pub facet_debounce_ms: u64,
}

fn default_max_image_bytes() -> u64 {
    1_000_000
}

fn default_max_image_dimension() -> u32 {
    2048
}

fn default_facet_debounce_ms() -> u64 {
    150
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: None,
            max_image_bytes: default_max_image_bytes(),
            max_image_dimension: default_max_image_dimension(),
            facet_debounce_ms: default_facet_debounce_ms(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.max_image_dimension > 0,
            "max_image_dimension must be at least 1 pixel"
        );
        ensure!(self.max_image_bytes > 0, "max_image_bytes must be at least 1 byte");
        Ok(())
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Image compression limits derived from this config
    pub fn compress_options(&self) -> CompressOptions {
        CompressOptions {
            max_size: self.max_image_bytes,
            max_dimension: self.max_image_dimension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.max_image_bytes, 1_000_000);
        assert_eq!(config.max_image_dimension, 2048);
        assert!(config.language.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "language = \"pt\"\nmax_image_dimension = 1024\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.language.as_deref(), Some("pt"));
        assert_eq!(config.max_image_dimension, 1024);
        assert_eq!(config.max_image_bytes, 1_000_000);
        assert_eq!(config.facet_debounce_ms, 150);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            max_image_bytes: 500_000,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.max_image_bytes, 500_000);
        assert_eq!(loaded.compress_options().max_size, 500_000);
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "max_image_dimension = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_image_dimension"));

        std::fs::write(&path, "max_image_bytes = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
