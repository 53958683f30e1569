//! Application configuration management.
//!
//! Settings are layered with `figment`, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config PATH`, or `config.toml` in the platform config
//!    directory (XDG on Linux, AppData on Windows)
//! 3. `DUPESIFT_*` environment variables (e.g. `DUPESIFT_THRESHOLD=3`)
//! 4. CLI flags, applied by the caller on the extracted value
//!
//! # Example file
//!
//! ```toml
//! algorithm = "dhash"
//! threshold = 3
//! table_path = "file_list.csv"
//! priority_folders = ["./keep", "./archive"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::PerceptualAlgorithm;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPESIFT_";

/// Default location of the persisted table.
pub const DEFAULT_TABLE_PATH: &str = "file_list.csv";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exclusive distance bound; `None` uses the algorithm's default.
    pub threshold: Option<u32>,
    /// Fingerprint algorithm.
    pub algorithm: PerceptualAlgorithm,
    /// Where `scan` writes the table and other commands read it.
    pub table_path: PathBuf,
    /// Directories to keep, most preferred first.
    pub priority_folders: Vec<String>,
    /// Write a blank row between the grouped and singleton blocks.
    pub separator_row: bool,
    /// Worker threads for fingerprinting.
    pub io_threads: usize,
    /// Delete permanently instead of moving to the trash.
    pub permanent: bool,
    /// Skip hidden files and directories while scanning.
    pub skip_hidden: bool,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: None,
            algorithm: PerceptualAlgorithm::default(),
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            priority_folders: Vec::new(),
            separator_row: true,
            io_threads: 4,
            permanent: false,
            skip_hidden: false,
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Build the layered figment without extracting it.
    ///
    /// `explicit` replaces the platform config file when given.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match explicit {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::config_path() {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the effective configuration.
    ///
    /// A missing file is not an error; a malformed one is.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` does not exist, or if any layer holds
    /// a value of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }
        let config: Config = Self::figment(explicit)
            .extract()
            .context("Failed to load configuration")?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Threshold to cluster with.
    #[must_use]
    pub fn effective_threshold(&self) -> u32 {
        self.threshold
            .unwrap_or_else(|| self.algorithm.default_threshold())
    }

    /// Render as TOML, suitable for a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Platform-specific configuration file, if a home directory is known.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupesift", "dupesift")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_threshold(), 5);
        assert!(config.separator_row);
    }

    #[test]
    fn test_effective_threshold_follows_algorithm() {
        let config = Config {
            algorithm: PerceptualAlgorithm::Phash,
            ..Config::default()
        };
        assert_eq!(config.effective_threshold(), 10);

        let config = Config {
            threshold: Some(0),
            ..config
        };
        assert_eq!(config.effective_threshold(), 0);
    }

    #[test]
    fn test_toml_layer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "algorithm = \"dhash\"\npriority_folders = [\"./keep\"]\nseparator_row = false\n",
        )
        .unwrap();

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&path))
            .extract()
            .unwrap();
        assert_eq!(config.algorithm, PerceptualAlgorithm::Dhash);
        assert_eq!(config.priority_folders, vec!["./keep".to_string()]);
        assert!(!config.separator_row);
        assert_eq!(config.effective_threshold(), 2);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config {
            threshold: Some(7),
            priority_folders: vec!["./a".into()],
            ..Config::default()
        };
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
