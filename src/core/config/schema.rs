//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: timeouts must be positive and
//! skip entries must be non-empty relative paths.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// temp_dir = "/var/tmp/gitsnap"
/// cache_dir = "/home/me/.cache/gitsnap"
/// progress = false
/// timeout_secs = 300
///
/// [walker]
/// skip_dirs = ["node_modules", "vendor/generated"]
/// skip_files = ["package-lock.json"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Parent directory for temporary clones (system temp dir if unset)
    pub temp_dir: Option<String>,

    /// Directory for the file-backed artifact cache (no cache if unset)
    pub cache_dir: Option<String>,

    /// Show clone progress
    pub progress: Option<bool>,

    /// Overall deadline for one acquisition, in seconds
    pub timeout_secs: Option<u64>,

    /// Walker settings
    pub walker: Option<WalkerConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        for (key, value) in [("temp_dir", &self.temp_dir), ("cache_dir", &self.cache_dir)] {
            if value.as_deref() == Some("") {
                return Err(ConfigError::InvalidValue(format!("{key} cannot be empty")));
            }
        }

        if let Some(walker) = &self.walker {
            walker.validate()?;
        }

        Ok(())
    }
}

/// Paths the walker never descends into or reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WalkerConfig {
    /// Directory names or tree-relative directory paths to skip
    pub skip_dirs: Vec<String>,

    /// File names or tree-relative file paths to skip
    pub skip_files: Vec<String>,
}

impl WalkerConfig {
    /// Validate skip entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in self.skip_dirs.iter().chain(&self.skip_files) {
            let trimmed = entry.trim_matches('/');
            if trimmed.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid skip entry '{entry}': must name a path"
                )));
            }
            if trimmed.split('/').any(|part| part == "..") {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid skip entry '{entry}': must stay inside the tree"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FileConfig::default();
        assert!(config.temp_dir.is_none());
        assert!(config.progress.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = FileConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_dirs_rejected() {
        let config = FileConfig {
            cache_dir: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn skip_entries_validated() {
        let ok = WalkerConfig {
            skip_dirs: vec!["node_modules".into(), "a/b/".into()],
            skip_files: vec!["Cargo.lock".into()],
        };
        assert!(ok.validate().is_ok());

        let empty = WalkerConfig {
            skip_dirs: vec!["/".into()],
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let escaping = WalkerConfig {
            skip_files: vec!["../secret".into()],
            ..Default::default()
        };
        assert!(escaping.validate().is_err());
    }

    #[test]
    fn roundtrip() {
        let config = FileConfig {
            temp_dir: Some("/tmp/snap".into()),
            cache_dir: Some("/tmp/cache".into()),
            progress: Some(false),
            timeout_secs: Some(120),
            walker: Some(WalkerConfig {
                skip_dirs: vec!["vendor".into()],
                skip_files: vec![],
            }),
        };

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: FileConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn reject_unknown_fields() {
        let result: Result<FileConfig, _> = toml::from_str("progress = true\nbogus = 1\n");
        assert!(result.is_err());
    }
}
