use crate::claude_settings;
use crate::error::AppError;
use crate::output;
use crate::providers::{ProviderConfig, ProviderId};
use crate::settings::CsSettings;

use super::Context;

/// `cs <provider> [--reset]`, or `cs --reset` to re-apply the current provider.
pub fn run(ctx: &Context, provider: Option<&str>, reset: bool) -> Result<(), AppError> {
    let mut settings = CsSettings::load(&ctx.paths)?;
    let id = match provider {
        Some(name) => name.parse()?,
        None => settings.current,
    };

    let config = switch_provider(ctx, &mut settings, id, reset)?;

    output::success(&format!("Switched to {id}"));
    if reset {
        output::info("Models reset to defaults");
    }
    super::print_provider_details(&config);
    super::warn_missing_token(id, &config);
    output::info(&ctx.shell.reload_hint());
    Ok(())
}

/// Applies `id` everywhere it has to show up and makes it current.
pub fn switch_provider(
    ctx: &Context,
    settings: &mut CsSettings,
    id: ProviderId,
    reset: bool,
) -> Result<ProviderConfig, AppError> {
    if reset {
        settings.reset_models(id);
    }
    let config = settings.provider(id);

    claude_settings::apply_provider(&ctx.paths.claude_settings_file(), &config)?;
    cs_shell::upsert_block(&ctx.shell.startup_file, &config.export_block())?;

    settings.set_current(id);
    settings.save(&ctx.paths)?;
    log::info!("Switched provider to {id}");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::providers::ProviderUpdate;

    #[test]
    fn switch_writes_block_and_settings() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let ctx = context(temp_dir.path());
        std::fs::write(&ctx.shell.startup_file, "alias ll='ls -l'\n")
            .expect("rc file should be written");

        run(&ctx, Some("z"), false).expect("switch should succeed");

        let rc = std::fs::read_to_string(&ctx.shell.startup_file).expect("rc should be readable");
        assert!(rc.starts_with("alias ll='ls -l'\n\n# ===== CS CONFIG START ====="));
        assert!(rc.contains("export ANTHROPIC_BASE_URL=\"https://api.z.ai/api/anthropic\""));

        let settings = CsSettings::load(&ctx.paths).expect("settings should load");
        assert_eq!(settings.current, ProviderId::Z);

        let claude = std::fs::read_to_string(ctx.paths.claude_settings_file())
            .expect("claude settings should exist");
        assert!(claude.contains("glm-4.5-air"));
    }

    #[test]
    fn switching_twice_keeps_one_block() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let ctx = context(temp_dir.path());

        run(&ctx, Some("kimi"), false).expect("first switch should succeed");
        run(&ctx, Some("claude"), false).expect("second switch should succeed");

        let rc = std::fs::read_to_string(&ctx.shell.startup_file).expect("rc should be readable");
        assert_eq!(rc.matches("# ===== CS CONFIG START =====").count(), 1);
        assert!(rc.contains("https://api.anthropic.com"));
        assert!(!rc.contains("kimi"));
    }

    #[test]
    fn unknown_provider_is_rejected_without_writes() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let ctx = context(temp_dir.path());

        let error = run(&ctx, Some("openai"), false).expect_err("unknown provider should fail");

        assert!(matches!(error, AppError::Provider(_)));
        assert!(!ctx.shell.startup_file.exists());
    }

    #[test]
    fn reset_without_provider_reapplies_current() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let ctx = context(temp_dir.path());
        let mut settings = CsSettings::load(&ctx.paths).expect("settings should load");
        settings.update_provider(
            ProviderId::Minimax,
            &ProviderUpdate {
                opus_model: Some("custom-opus".to_string()),
                ..ProviderUpdate::default()
            },
        );
        settings.set_current(ProviderId::Minimax);
        settings.save(&ctx.paths).expect("settings should save");

        run(&ctx, None, true).expect("reset should succeed");

        let settings = CsSettings::load(&ctx.paths).expect("settings should reload");
        assert_eq!(settings.current, ProviderId::Minimax);
        assert_eq!(
            settings.provider(ProviderId::Minimax).opus_model,
            "MiniMax-M2.1"
        );
    }
}
