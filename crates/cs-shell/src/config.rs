use crate::block::{ExportBlock, find_block};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A shell startup file held in memory while the managed block is edited.
pub struct ShellConfig {
    pub config_path: PathBuf,
    pub content: String,
    exists: bool,
}

impl ShellConfig {
    pub fn load(config_path: PathBuf) -> Result<Self, ConfigError> {
        let exists = config_path.exists();
        let content = if exists {
            fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::io("read", &config_path, source))?
        } else {
            String::new()
        };

        Ok(Self {
            config_path,
            content,
            exists,
        })
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Replace the managed block, or append one after the existing content
    /// separated by a single blank line.
    #[must_use]
    pub fn upsert_block(&self, block: &ExportBlock) -> ShellConfigEdit {
        let rendered = block.render();

        let (modified, change) = match find_block(&self.content) {
            Some(range) => {
                let mut modified = String::with_capacity(self.content.len());
                modified.push_str(&self.content[..range.start]);
                modified.push_str(&rendered);
                modified.push_str(&self.content[range.end..]);
                (modified, "Replaced managed export block")
            }
            None => {
                let trimmed = self.content.trim_end();
                let modified = if trimmed.is_empty() {
                    format!("{rendered}\n")
                } else {
                    format!("{trimmed}\n\n{rendered}\n")
                };
                (modified, "Appended managed export block")
            }
        };

        let changes = if modified == self.content {
            vec![]
        } else {
            vec![change.to_string()]
        };

        ShellConfigEdit {
            original: self.content.clone(),
            modified,
            changes,
        }
    }

    /// Cut the managed block out verbatim. Surrounding blank lines are left
    /// as they are.
    #[must_use]
    pub fn remove_block(&self) -> ShellConfigEdit {
        let Some(range) = find_block(&self.content) else {
            return ShellConfigEdit {
                original: self.content.clone(),
                modified: self.content.clone(),
                changes: vec![],
            };
        };

        let mut modified = String::with_capacity(self.content.len());
        modified.push_str(&self.content[..range.start]);
        modified.push_str(&self.content[range.end..]);

        ShellConfigEdit {
            original: self.content.clone(),
            modified,
            changes: vec!["Removed managed export block".to_string()],
        }
    }

    pub fn apply_edit(&mut self, edit: &ShellConfigEdit) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::io("create directory for", &self.config_path, source))?;
        }

        fs::write(&self.config_path, &edit.modified)
            .map_err(|source| ConfigError::io("write", &self.config_path, source))?;
        self.content.clone_from(&edit.modified);
        self.exists = true;

        Ok(())
    }
}

pub struct ShellConfigEdit {
    pub original: String,
    pub modified: String,
    pub changes: Vec<String>,
}

impl ShellConfigEdit {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    #[must_use]
    pub fn diff_preview(&self) -> String {
        if !self.has_changes() {
            return "No changes needed.".to_string();
        }

        let mut preview = String::new();

        for change in &self.changes {
            let _ = writeln!(preview, "+ {change}");
        }

        preview
    }
}

/// Write `block` into the startup file at `path`, creating the file when it
/// does not exist yet.
pub fn upsert_block(path: &Path, block: &ExportBlock) -> Result<(), ConfigError> {
    let mut config = ShellConfig::load(path.to_path_buf())?;
    let edit = config.upsert_block(block);

    if edit.has_changes() || !config.exists() {
        log::debug!("{}: {}", path.display(), edit.diff_preview().trim_end());
        config.apply_edit(&edit)?;
    } else {
        log::debug!("{}: export block already up to date", path.display());
    }

    Ok(())
}

/// Remove the managed block from the startup file at `path`. Missing files and
/// files without a block are left untouched.
pub fn remove_block(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }

    let mut config = ShellConfig::load(path.to_path_buf())?;
    let edit = config.remove_block();
    if !edit.has_changes() {
        return Ok(false);
    }

    config.apply_edit(&edit)?;
    Ok(true)
}
