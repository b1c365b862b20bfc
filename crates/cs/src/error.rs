use std::path::PathBuf;

use thiserror::Error;

use crate::providers::{ProviderId, UnknownProvider};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Paths(#[from] cs_platform::AppPathsError),

    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Terminal(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    ShellConfig(#[from] cs_shell::ConfigError),

    #[error(transparent)]
    Provider(#[from] UnknownProvider),

    #[error("Failed to check for updates: {0}")]
    Registry(#[from] cs_core::RegistryError),

    #[error("Invalid version format: {0}")]
    InvalidVersion(String),

    #[error("Version {0} not found in registry")]
    VersionNotFound(String),

    #[error("No stable versions found in registry")]
    NoStableVersions,

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl AppError {
    /// A follow-up line telling the user how to fix the input.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Provider(_) => Some(format!(
                "Valid providers: {}",
                ProviderId::valid_names()
            )),
            Self::InvalidVersion(_) => {
                Some("Version must be valid semver (e.g., 1.0.0)".to_string())
            }
            Self::VersionNotFound(_) => {
                Some("Run 'cs update list' to see available versions".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_carries_valid_names() {
        let error = AppError::from(UnknownProvider("openai".to_string()));

        assert_eq!(error.to_string(), "Invalid provider: openai");
        assert_eq!(
            error.hint().as_deref(),
            Some("Valid providers: claude, claudible, jjuidev, kimi, z, minimax")
        );
    }

    #[test]
    fn io_error_names_the_path() {
        let error = AppError::Io {
            action: "write",
            path: PathBuf::from("/tmp/settings.json"),
            source: std::io::Error::other("disk full"),
        };

        assert_eq!(
            error.to_string(),
            "Failed to write /tmp/settings.json: disk full"
        );
        assert!(error.hint().is_none());
    }
}
