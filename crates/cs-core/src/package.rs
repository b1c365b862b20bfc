use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cs_platform::HideWindow;
use log::{debug, error, info, trace};
use thiserror::Error;
use tokio::process::Command;

pub const PACKAGE_NAME: &str = "@jjuidev/cs";

const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    #[error("Failed to run `{command}`: {details}")]
    Spawn { command: String, details: String },

    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
}

/// Installs a pinned version of `cs` and reports which version is on `PATH`.
#[async_trait]
pub trait PackageManager: Send + Sync {
    async fn install(&self, version: &str) -> Result<(), PackageError>;

    /// Raw, trimmed output of the installed binary's version report.
    async fn installed_version(&self) -> Result<String, PackageError>;

    /// The command a user can paste to install `version` by hand.
    fn install_command(&self, version: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct NpmPackageManager {
    npm: String,
    binary: String,
    package: String,
    install_timeout: Duration,
    verify_timeout: Duration,
}

impl Default for NpmPackageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NpmPackageManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            npm: platform_program("npm"),
            binary: platform_program("cs"),
            package: PACKAGE_NAME.to_string(),
            install_timeout: INSTALL_TIMEOUT,
            verify_timeout: VERIFY_TIMEOUT,
        }
    }

    fn package_spec(&self, version: &str) -> String {
        format!("{}@{version}", self.package)
    }

    async fn execute(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, PackageError> {
        let command = format!("{program} {}", args.join(" "));
        info!("Executing: {command}");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .hide_window();

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!("Failed to spawn `{command}`: {e}");
                return Err(PackageError::Spawn {
                    command,
                    details: e.to_string(),
                });
            }
            Err(_) => {
                error!("`{command}` timed out after {}s", timeout.as_secs());
                return Err(PackageError::Timeout {
                    command,
                    seconds: timeout.as_secs(),
                });
            }
        };

        debug!("`{command}` exit status: {:?}", output.status);
        trace!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        if !output.stderr.is_empty() {
            trace!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        }

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("`{command}` failed: stderr='{stderr}'");
            Err(PackageError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}

#[async_trait]
impl PackageManager for NpmPackageManager {
    async fn install(&self, version: &str) -> Result<(), PackageError> {
        let spec = self.package_spec(version);
        self.execute(&self.npm, &["install", "-g", &spec], self.install_timeout)
            .await
            .map(|_| ())
    }

    async fn installed_version(&self) -> Result<String, PackageError> {
        self.execute(&self.binary, &["--version"], self.verify_timeout)
            .await
            .map(|stdout| stdout.trim().to_string())
    }

    fn install_command(&self, version: &str) -> String {
        format!("npm install -g {}", self.package_spec(version))
    }
}

/// npm and npm-installed binaries are `.cmd` shims on Windows.
fn platform_program(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.cmd")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_command_pins_version() {
        let npm = NpmPackageManager::new();
        assert_eq!(npm.install_command("1.1.0"), "npm install -g @jjuidev/cs@1.1.0");
    }

    #[test]
    fn default_timeouts() {
        let npm = NpmPackageManager::default();
        assert_eq!(npm.install_timeout, Duration::from_secs(120));
        assert_eq!(npm.verify_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let npm = NpmPackageManager {
            npm: "cs-definitely-not-installed-npm".to_string(),
            ..NpmPackageManager::new()
        };

        let result = npm.install("1.0.0").await;
        assert!(matches!(result, Err(PackageError::Spawn { .. })));
    }

    #[test]
    fn timeout_error_mentions_command_and_seconds() {
        let error = PackageError::Timeout {
            command: "npm install -g @jjuidev/cs@1.2.0".to_string(),
            seconds: 120,
        };
        assert_eq!(
            error.to_string(),
            "`npm install -g @jjuidev/cs@1.2.0` timed out after 120s"
        );
    }
}
