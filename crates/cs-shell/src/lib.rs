#![allow(clippy::missing_errors_doc)]

mod block;
mod config;
mod detect;

pub use block::{
    AUTH_TOKEN_VAR, BASE_URL_VAR, END_MARKER, ExportBlock, HAIKU_MODEL_VAR, OPUS_MODEL_VAR,
    SONNET_MODEL_VAR, START_MARKER, find_block,
};
pub use config::{ConfigError, ShellConfig, ShellConfigEdit, remove_block, upsert_block};
pub use detect::{ShellInfo, ShellType, detect_shell, detect_shell_from};
