use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = ".cs";
const CLAUDE_DIR_NAME: &str = ".claude";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
}

/// Filesystem locations owned or touched by `cs`.
///
/// Everything lives under the user's home directory so the layout is the same
/// on every platform: `~/.cs` for our own state and `~/.claude` for the
/// settings file of the coding CLI we configure.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub claude_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current user.
    ///
    /// # Errors
    /// Returns an error when the home directory cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
        Ok(Self::from_home(&home))
    }

    #[must_use]
    pub fn from_home(home: &Path) -> Self {
        Self {
            config_dir: home.join(APP_DIR_NAME),
            claude_dir: home.join(CLAUDE_DIR_NAME),
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.config_dir.join("debug.log")
    }

    #[must_use]
    pub fn claude_settings_file(&self) -> PathBuf {
        self.claude_dir.join("settings.json")
    }

    /// Ensure the `~/.cs` directory exists on disk.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)
    }
}
