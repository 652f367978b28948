//! Engine configuration types.

use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::FileOpError;

/// Default number of operations kept on each history stack.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Files at or above this size are not snapshotted for delete-undo (10 MiB).
pub const DEFAULT_UNDO_CONTENT_LIMIT: u64 = 10 * 1024 * 1024;

/// Total file content kept in memory for one delete-undo record (64 MiB).
pub const DEFAULT_UNDO_TOTAL_LIMIT: u64 = 64 * 1024 * 1024;

/// Upper bound of numbered candidates probed before falling back to a timestamp.
pub const DEFAULT_MAX_NUMBERING_ATTEMPTS: u32 = 10_000;

/// Configuration for the file operations engine.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of records on the undo and redo stacks.
    #[builder(default = "DEFAULT_MAX_HISTORY")]
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Deleted files smaller than this are kept in memory so undo can restore them.
    #[builder(default = "DEFAULT_UNDO_CONTENT_LIMIT")]
    #[serde(default = "default_undo_content_limit")]
    pub undo_content_limit: u64,

    /// Cap on the content kept across all files of one delete. Files past
    /// it are deleted without a restorable copy.
    #[builder(default = "DEFAULT_UNDO_TOTAL_LIMIT")]
    #[serde(default = "default_undo_total_limit")]
    pub undo_total_limit: u64,

    /// How many numbered names to try before using a timestamp suffix.
    #[builder(default = "DEFAULT_MAX_NUMBERING_ATTEMPTS")]
    #[serde(default = "default_max_numbering_attempts")]
    pub max_numbering_attempts: u32,

    /// Move deleted items to the OS trash when available.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub use_trash: bool,

    /// Carry modification times over to copied files.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_undo_content_limit() -> u64 {
    DEFAULT_UNDO_CONTENT_LIMIT
}

fn default_undo_total_limit() -> u64 {
    DEFAULT_UNDO_TOTAL_LIMIT
}

fn default_max_numbering_attempts() -> u32 {
    DEFAULT_MAX_NUMBERING_ATTEMPTS
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_history == Some(0) {
            return Err("max_history must be greater than zero".to_string());
        }
        if self.max_numbering_attempts == Some(0) {
            return Err("max_numbering_attempts must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Create a new config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Location of the user configuration file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fileshelf").join("config.toml"))
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, FileOpError> {
        let content = fs::read_to_string(path).map_err(|e| FileOpError::io(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| FileOpError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Load the user config, falling back to defaults when none exists.
    pub fn load_or_default() -> Result<Self, FileOpError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Serialize this config as TOML.
    pub fn to_toml(&self) -> Result<String, FileOpError> {
        toml::to_string_pretty(self).map_err(|e| FileOpError::Config {
            message: e.to_string(),
        })
    }

    fn check(&self) -> Result<(), FileOpError> {
        if self.max_history == 0 {
            return Err(FileOpError::Config {
                message: "max_history must be greater than zero".to_string(),
            });
        }
        if self.max_numbering_attempts == 0 {
            return Err(FileOpError::Config {
                message: "max_numbering_attempts must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            undo_content_limit: DEFAULT_UNDO_CONTENT_LIMIT,
            undo_total_limit: DEFAULT_UNDO_TOTAL_LIMIT,
            max_numbering_attempts: DEFAULT_MAX_NUMBERING_ATTEMPTS,
            use_trash: true,
            preserve_timestamps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .max_history(5usize)
            .use_trash(false)
            .build()
            .unwrap();

        assert_eq!(config.max_history, 5);
        assert!(!config.use_trash);
        assert_eq!(config.undo_content_limit, DEFAULT_UNDO_CONTENT_LIMIT);
        assert_eq!(config.max_numbering_attempts, 10_000);
    }

    #[test]
    fn test_config_builder_rejects_zero_history() {
        let result = EngineConfig::builder().max_history(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.max_history, 100);
        assert_eq!(config.undo_content_limit, 10 * 1024 * 1024);
        assert_eq!(config.undo_total_limit, 64 * 1024 * 1024);
        assert!(config.use_trash);
        assert!(config.preserve_timestamps);
    }

    #[test]
    fn test_config_load_partial_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_history = 20\nuse_trash = false\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_history, 20);
        assert!(!config.use_trash);
        assert_eq!(config.max_numbering_attempts, DEFAULT_MAX_NUMBERING_ATTEMPTS);
    }

    #[test]
    fn test_config_load_rejects_invalid() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_history = 0\n").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(FileOpError::Config { .. })
        ));

        fs::write(&path, "max_history = \"lots\"\n").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = EngineConfig::builder()
            .max_history(42usize)
            .build()
            .unwrap();
        let text = config.to_toml().unwrap();
        assert!(text.contains("max_history = 42"));
    }
}
