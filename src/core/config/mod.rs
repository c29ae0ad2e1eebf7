//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$GITSNAP_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitsnap/config.toml`
//! 3. `~/.gitsnap/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use gitsnap::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("progress: {}", config.progress());
//! if let Some(dir) = config.cache_dir() {
//!     println!("cache: {}", dir.display());
//! }
//! ```

pub mod schema;

pub use schema::{FileConfig, WalkerConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GITSNAP_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw values from the config file
    pub file: FileConfig,
    /// Path the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or fails
    /// validation. A missing config file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        let found = Self::locate(explicit, xdg, dirs::home_dir());
        match found {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Pick the first existing config file among the search locations.
    fn locate(
        explicit: Option<PathBuf>,
        xdg_home: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Option<PathBuf> {
        let candidates = [
            explicit,
            xdg_home.map(|p| p.join("gitsnap/config.toml")),
            home.map(|p| p.join(".gitsnap/config.toml")),
        ];
        candidates.into_iter().flatten().find(|p| p.is_file())
    }

    /// Get the canonical config path (`~/.gitsnap/config.toml`).
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gitsnap/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Writes to a sibling temp file,
    /// syncs it, then renames over the target.
    pub fn write(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// Parent directory for temporary clones. `None` means the system default.
    pub fn temp_dir(&self) -> Option<PathBuf> {
        self.file.temp_dir.as_ref().map(PathBuf::from)
    }

    /// Directory for the file-backed cache. `None` disables caching.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.file.cache_dir.as_ref().map(PathBuf::from)
    }

    /// Whether to show clone progress. Defaults to `true`.
    pub fn progress(&self) -> bool {
        self.file.progress.unwrap_or(true)
    }

    /// Acquisition deadline, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.file.timeout_secs.map(Duration::from_secs)
    }

    /// Walker skip rules. Defaults to none.
    pub fn walker(&self) -> WalkerConfig {
        self.file.walker.clone().unwrap_or_default()
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
