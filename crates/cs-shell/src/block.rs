use std::fmt::Write as _;
use std::ops::Range;

pub const START_MARKER: &str = "# ===== CS CONFIG START =====";
pub const END_MARKER: &str = "# ===== CS CONFIG END =====";

pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
pub const AUTH_TOKEN_VAR: &str = "ANTHROPIC_AUTH_TOKEN";
pub const OPUS_MODEL_VAR: &str = "ANTHROPIC_DEFAULT_OPUS_MODEL";
pub const SONNET_MODEL_VAR: &str = "ANTHROPIC_DEFAULT_SONNET_MODEL";
pub const HAIKU_MODEL_VAR: &str = "ANTHROPIC_DEFAULT_HAIKU_MODEL";

/// Locate the managed block in `content`.
///
/// The block starts at the first [`START_MARKER`] and ends after the first
/// [`END_MARKER`] that follows it. A start marker without a matching end
/// marker is treated as no block at all.
#[must_use]
pub fn find_block(content: &str) -> Option<Range<usize>> {
    let start = content.find(START_MARKER)?;
    let end = content[start..].find(END_MARKER)? + start + END_MARKER.len();
    Some(start..end)
}

/// The export statements written between the markers.
///
/// Values are wrapped in double quotes verbatim. Embedded `"`, `$` or
/// backticks are not escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlock {
    exports: Vec<(&'static str, String)>,
}

impl ExportBlock {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            exports: vec![
                (BASE_URL_VAR, base_url.into()),
                (AUTH_TOKEN_VAR, auth_token.into()),
            ],
        }
    }

    /// Append model exports after the URL and token. Empty names are skipped.
    #[must_use]
    pub fn with_models(mut self, opus: &str, sonnet: &str, haiku: &str) -> Self {
        for (name, value) in [
            (OPUS_MODEL_VAR, opus),
            (SONNET_MODEL_VAR, sonnet),
            (HAIKU_MODEL_VAR, haiku),
        ] {
            if !value.is_empty() {
                self.exports.push((name, value.to_string()));
            }
        }
        self
    }

    #[must_use]
    pub fn exports(&self) -> &[(&'static str, String)] {
        &self.exports
    }

    /// Marker-delimited text, without a trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut block = String::from(START_MARKER);
        block.push('\n');
        for (name, value) in &self.exports {
            let _ = writeln!(block, "export {name}=\"{value}\"");
        }
        block.push_str(END_MARKER);
        block
    }
}
