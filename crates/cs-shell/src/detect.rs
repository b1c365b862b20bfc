use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Zsh,
    Bash,
    Fish,
    Unknown,
}

impl ShellType {
    /// Maps the executable name of a login shell to its family.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "zsh" => Self::Zsh,
            "bash" => Self::Bash,
            "fish" => Self::Fish,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
            Self::Fish => "fish",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Startup file relative to the home directory. Unknown shells fall back
    /// to the zsh file.
    fn startup_file(self, home: &Path) -> PathBuf {
        match self {
            Self::Bash => home.join(".bashrc"),
            Self::Fish => home.join(".config").join("fish").join("config.fish"),
            Self::Zsh | Self::Unknown => home.join(".zshrc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInfo {
    pub shell_type: ShellType,
    pub startup_file: PathBuf,
    pub source_command: String,
}

impl ShellInfo {
    /// What to tell the user so a running terminal picks up new exports.
    #[must_use]
    pub fn reload_hint(&self) -> String {
        if self.shell_type.is_known() {
            format!("Please restart your terminal or run: {}", self.source_command)
        } else {
            "Please restart your terminal to apply changes".to_string()
        }
    }
}

/// Detect the user's login shell from `$SHELL`.
#[must_use]
pub fn detect_shell() -> ShellInfo {
    let shell = std::env::var_os("SHELL");
    let home = dirs::home_dir().unwrap_or_else(|| {
        log::warn!("Home directory unavailable, shell startup file will be relative");
        PathBuf::new()
    });
    detect_shell_from(shell.as_deref(), &home)
}

#[must_use]
pub fn detect_shell_from(shell: Option<&OsStr>, home: &Path) -> ShellInfo {
    let shell_type = shell
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(OsStr::to_str)
        .map_or(ShellType::Unknown, ShellType::from_name);

    let startup_file = shell_type.startup_file(home);
    let source_command = format!("source \"{}\"", startup_file.display());

    log::debug!(
        "Detected shell {} with startup file {}",
        shell_type.name(),
        startup_file.display()
    );

    ShellInfo {
        shell_type,
        startup_file,
        source_command,
    }
}
