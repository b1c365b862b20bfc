use std::collections::BTreeMap;
use std::path::Path;

use cs_platform::AppPaths;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::providers::{ProviderConfig, ProviderId, ProviderUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsSettings {
    #[serde(
        default = "default_providers",
        deserialize_with = "deserialize_providers",
        serialize_with = "serialize_providers"
    )]
    pub providers: BTreeMap<ProviderId, ProviderConfig>,

    #[serde(
        default,
        deserialize_with = "deserialize_current",
        serialize_with = "serialize_current"
    )]
    pub current: ProviderId,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug_logging: bool,
}

fn default_providers() -> BTreeMap<ProviderId, ProviderConfig> {
    ProviderId::ALL
        .into_iter()
        .map(|id| (id, id.defaults()))
        .collect()
}

fn deserialize_providers<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<ProviderId, ProviderConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, ProviderConfig>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, config)| ProviderId::from_name(&name).map(|id| (id, config)))
        .collect())
}

fn serialize_providers<S>(
    map: &BTreeMap<ProviderId, ProviderConfig>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let raw: BTreeMap<&str, &ProviderConfig> =
        map.iter().map(|(id, config)| (id.as_str(), config)).collect();
    raw.serialize(serializer)
}

fn deserialize_current<'de, D>(deserializer: D) -> Result<ProviderId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(ProviderId::from_name(&raw).unwrap_or_default())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_current<S>(current: &ProviderId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(current.as_str())
}

impl Default for CsSettings {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            current: ProviderId::default(),
            debug_logging: false,
        }
    }
}

impl CsSettings {
    /// Loads `~/.cs/settings.json`, writing the defaults when it does not exist yet.
    pub fn load(paths: &AppPaths) -> Result<Self, AppError> {
        paths.ensure_dirs().map_err(|source| AppError::Io {
            action: "create",
            path: paths.config_dir.clone(),
            source,
        })?;

        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            let settings = Self::default();
            settings.save_to(&settings_path)?;
            log::info!("Created default settings at {}", settings_path.display());
            return Ok(settings);
        }

        Ok(Self::read_from(&settings_path))
    }

    fn read_from(path: &Path) -> Self {
        let mut settings: Self = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!(
                    "Settings at {} are invalid, using defaults: {error}",
                    path.display()
                );
                Self::default()
            }),
            Err(error) => {
                log::warn!("Failed to read {}: {error}", path.display());
                Self::default()
            }
        };

        for id in ProviderId::ALL {
            settings.providers.entry(id).or_insert_with(|| id.defaults());
        }

        settings
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), AppError> {
        paths.ensure_dirs().map_err(|source| AppError::Io {
            action: "create",
            path: paths.config_dir.clone(),
            source,
        })?;
        self.save_to(&paths.settings_file())
    }

    fn save_to(&self, path: &Path) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| AppError::Io {
            action: "write",
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn provider(&self, id: ProviderId) -> ProviderConfig {
        self.providers
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.defaults())
    }

    pub fn update_provider(&mut self, id: ProviderId, update: &ProviderUpdate) {
        self.providers
            .entry(id)
            .or_insert_with(|| id.defaults())
            .apply(update);
    }

    /// Restores the default model names, keeping the stored URL and token.
    pub fn reset_models(&mut self, id: ProviderId) {
        let defaults = id.defaults();
        let config = self.providers.entry(id).or_insert_with(|| id.defaults());
        config.opus_model = defaults.opus_model;
        config.sonnet_model = defaults.sonnet_model;
        config.haiku_model = defaults.haiku_model;
    }

    pub fn set_current(&mut self, id: ProviderId) {
        self.current = id;
    }
}
