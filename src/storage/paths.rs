//! Application paths for config and cache.

use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

/// Application paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Cache directory. Holds the session file.
    pub cache: PathBuf,
}

impl AppPaths {
    /// Create paths for the docstream application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "docstream", "docstream") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
                cache: proj_dirs.cache_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/docstream"),
                cache: home.join(".cache/docstream"),
            }
        }
    }

    /// Paths rooted at `root`, for tests and portable installs.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            config: root.join("config"),
            cache: root.join("cache"),
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the persisted session.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.cache.join("session.json")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
