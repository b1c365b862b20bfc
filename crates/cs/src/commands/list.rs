use colored::Colorize;

use crate::error::AppError;
use crate::output;
use crate::providers::{ProviderId, mask_token};
use crate::settings::CsSettings;

use super::Context;

pub fn run(ctx: &Context) -> Result<(), AppError> {
    let settings = CsSettings::load(&ctx.paths)?;

    output::intro("Providers");
    for line in provider_lines(&settings) {
        println!("{line}");
    }
    Ok(())
}

fn provider_lines(settings: &CsSettings) -> Vec<String> {
    ProviderId::ALL
        .into_iter()
        .map(|id| {
            let config = settings.provider(id);
            let marker = if id == settings.current {
                "→".green().bold().to_string()
            } else {
                " ".to_string()
            };
            let name = if id == settings.current {
                format!("{id:<10}").green().bold().to_string()
            } else {
                format!("{id:<10}")
            };
            format!(
                "{marker} {name} {}  token: {}  models: {} / {} / {}",
                config.base_url,
                mask_token(&config.auth_token),
                config.opus_model,
                config.sonnet_model,
                config.haiku_model,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_provider_is_marked() {
        colored::control::set_override(false);
        let mut settings = CsSettings::default();
        settings.set_current(ProviderId::Kimi);

        let lines = provider_lines(&settings);

        assert_eq!(lines.len(), ProviderId::ALL.len());
        let marked: Vec<_> = lines.iter().filter(|line| line.starts_with('→')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("kimi"));
        assert!(lines[0].contains("token: not set"));
    }
}
