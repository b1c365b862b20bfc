use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ProviderId {
    #[default]
    Claude,
    Claudible,
    Jjuidev,
    Kimi,
    Z,
    Minimax,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::Claude,
        ProviderId::Claudible,
        ProviderId::Jjuidev,
        ProviderId::Kimi,
        ProviderId::Z,
        ProviderId::Minimax,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Claudible => "claudible",
            Self::Jjuidev => "jjuidev",
            Self::Kimi => "kimi",
            Self::Z => "z",
            Self::Minimax => "minimax",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }

    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn defaults(self) -> ProviderConfig {
        let (base_url, opus, sonnet, haiku) = match self {
            Self::Claude => (
                "https://api.anthropic.com",
                "claude-opus-4.5",
                "claude-sonnet-4.5",
                "claude-haiku-4.5",
            ),
            Self::Claudible => (
                "https://claudible.io",
                "claude-opus-4.5",
                "claude-sonnet-4.5",
                "claude-haiku-4.5",
            ),
            Self::Jjuidev => (
                "https://ai.jjuidev.com",
                "gemini-claude-opus-4-5-thinking",
                "gemini-claude-sonnet-4-5-thinking",
                "gemini-claude-sonnet-4-5",
            ),
            Self::Kimi => (
                "https://api.kimi.com/coding",
                "kimi-k2.5",
                "kimi-k2.5",
                "kimi-k2.5",
            ),
            Self::Z => (
                "https://api.z.ai/api/anthropic",
                "glm-4.7",
                "glm-4.7",
                "glm-4.5-air",
            ),
            Self::Minimax => (
                "https://api.minimax.io/anthropic",
                "MiniMax-M2.1",
                "MiniMax-M2.1",
                "MiniMax-M2.1",
            ),
        };

        ProviderConfig {
            base_url: base_url.to_string(),
            auth_token: String::new(),
            opus_model: opus.to_string(),
            sonnet_model: sonnet.to_string(),
            haiku_model: haiku.to_string(),
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// One provider entry. JSON keys are the environment variable names so the
/// settings file reads the same as the exports it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "ANTHROPIC_BASE_URL", default)]
    pub base_url: String,
    #[serde(rename = "ANTHROPIC_AUTH_TOKEN", default)]
    pub auth_token: String,
    #[serde(rename = "ANTHROPIC_DEFAULT_OPUS_MODEL", default)]
    pub opus_model: String,
    #[serde(rename = "ANTHROPIC_DEFAULT_SONNET_MODEL", default)]
    pub sonnet_model: String,
    #[serde(rename = "ANTHROPIC_DEFAULT_HAIKU_MODEL", default)]
    pub haiku_model: String,
}

impl ProviderConfig {
    pub fn export_block(&self) -> cs_shell::ExportBlock {
        cs_shell::ExportBlock::new(&self.base_url, &self.auth_token).with_models(
            &self.opus_model,
            &self.sonnet_model,
            &self.haiku_model,
        )
    }

    pub fn apply(&mut self, update: &ProviderUpdate) {
        let fields = [
            (&mut self.base_url, &update.base_url),
            (&mut self.auth_token, &update.auth_token),
            (&mut self.opus_model, &update.opus_model),
            (&mut self.sonnet_model, &update.sonnet_model),
            (&mut self.haiku_model, &update.haiku_model),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                field.clone_from(value);
            }
        }
    }
}

/// Fields to overwrite on a provider; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ProviderUpdate {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub opus_model: Option<String>,
    pub sonnet_model: Option<String>,
    pub haiku_model: Option<String>,
}

impl ProviderUpdate {
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none()
            && self.auth_token.is_none()
            && self.opus_model.is_none()
            && self.sonnet_model.is_none()
            && self.haiku_model.is_none()
    }
}

/// `***` followed by the last four characters, or `not set`.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "not set".to_string();
    }
    let tail: String = {
        let chars: Vec<char> = token.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };
    format!("***{tail}")
}
