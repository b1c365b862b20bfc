use std::path::Path;

use cs_shell::{AUTH_TOKEN_VAR, BASE_URL_VAR, HAIKU_MODEL_VAR, OPUS_MODEL_VAR, SONNET_MODEL_VAR};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::providers::ProviderConfig;

/// Writes the provider into the `env` object of Claude's `settings.json`.
///
/// Every other key in the file is preserved. A missing or unparsable file is
/// treated as an empty object.
pub fn apply_provider(path: &Path, config: &ProviderConfig) -> Result<(), AppError> {
    let mut root = match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<Value>(&content).unwrap_or_else(|error| {
            log::warn!("Ignoring invalid JSON in {}: {error}", path.display());
            Value::Object(Map::new())
        }),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
        Err(source) => {
            return Err(AppError::Io {
                action: "read",
                path: path.to_path_buf(),
                source,
            });
        }
    };

    merge_env(&mut root, config);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| AppError::Io {
            action: "create",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let content = serde_json::to_string_pretty(&root)?;
    std::fs::write(path, content).map_err(|source| AppError::Io {
        action: "write",
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Updated env in {}", path.display());
    Ok(())
}

fn merge_env(root: &mut Value, config: &ProviderConfig) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let Some(object) = root.as_object_mut() else {
        return;
    };

    let env = object
        .entry("env")
        .or_insert_with(|| Value::Object(Map::new()));
    if !env.is_object() {
        *env = Value::Object(Map::new());
    }
    let Some(env) = env.as_object_mut() else {
        return;
    };

    // Empty models are written too, so nothing from the previous provider survives.
    for (name, value) in [
        (BASE_URL_VAR, &config.base_url),
        (AUTH_TOKEN_VAR, &config.auth_token),
        (OPUS_MODEL_VAR, &config.opus_model),
        (SONNET_MODEL_VAR, &config.sonnet_model),
        (HAIKU_MODEL_VAR, &config.haiku_model),
    ] {
        env.insert(name.to_string(), Value::String(value.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderId;

    #[test]
    fn creates_file_with_env() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join(".claude").join("settings.json");

        apply_provider(&path, &ProviderId::Z.defaults()).expect("settings should be written");

        let value: Value = serde_json::from_str(
            &std::fs::read_to_string(&path).expect("settings should be readable"),
        )
        .expect("settings should be JSON");
        assert_eq!(value["env"]["ANTHROPIC_BASE_URL"], "https://api.z.ai/api/anthropic");
        assert_eq!(value["env"]["ANTHROPIC_AUTH_TOKEN"], "");
        assert_eq!(value["env"]["ANTHROPIC_DEFAULT_HAIKU_MODEL"], "glm-4.5-air");
    }

    #[test]
    fn preserves_unrelated_keys() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"model": "opus", "env": {"DISABLE_TELEMETRY": "1", "ANTHROPIC_BASE_URL": "old"}}"#,
        )
        .expect("settings should be written");

        apply_provider(&path, &ProviderId::Kimi.defaults()).expect("settings should be updated");

        let value: Value = serde_json::from_str(
            &std::fs::read_to_string(&path).expect("settings should be readable"),
        )
        .expect("settings should be JSON");
        assert_eq!(value["model"], "opus");
        assert_eq!(value["env"]["DISABLE_TELEMETRY"], "1");
        assert_eq!(value["env"]["ANTHROPIC_BASE_URL"], "https://api.kimi.com/coding");
    }

    #[test]
    fn empty_model_overwrites_previous_provider() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("settings.json");
        let mut kimi = ProviderId::Kimi.defaults();
        kimi.opus_model = String::new();

        apply_provider(&path, &ProviderId::Z.defaults()).expect("z should be applied");
        apply_provider(&path, &kimi).expect("kimi should be applied");

        let value: Value = serde_json::from_str(
            &std::fs::read_to_string(&path).expect("settings should be readable"),
        )
        .expect("settings should be JSON");
        assert_eq!(value["env"]["ANTHROPIC_DEFAULT_OPUS_MODEL"], "");
        assert_eq!(value["env"]["ANTHROPIC_DEFAULT_SONNET_MODEL"], "kimi-k2.5");
        assert_eq!(value["env"]["ANTHROPIC_BASE_URL"], "https://api.kimi.com/coding");
    }

    #[test]
    fn non_object_env_is_replaced() {
        let mut root = serde_json::json!({ "env": "broken" });

        merge_env(&mut root, &ProviderId::Claude.defaults());

        assert_eq!(root["env"]["ANTHROPIC_BASE_URL"], "https://api.anthropic.com");
    }
}
