pub mod config;
pub mod current;
pub mod list;
pub mod switch;
pub mod unset;
pub mod update;

use cs_platform::AppPaths;
use cs_shell::ShellInfo;

use crate::output;
use crate::providers::{ProviderConfig, ProviderId, mask_token};

/// Per-invocation environment shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: AppPaths,
    pub shell: ShellInfo,
}

fn print_provider_details(config: &ProviderConfig) {
    output::detail(&format!("Base URL: {}", config.base_url));
    output::detail(&format!("Token:    {}", mask_token(&config.auth_token)));
    for (label, model) in [
        ("Opus", &config.opus_model),
        ("Sonnet", &config.sonnet_model),
        ("Haiku", &config.haiku_model),
    ] {
        if !model.is_empty() {
            output::detail(&format!("{label:<8}  {model}"));
        }
    }
}

fn warn_missing_token(id: ProviderId, config: &ProviderConfig) {
    if config.auth_token.is_empty() {
        output::warn(&format!("No token configured for {id}"));
        output::info(&format!("Set token with: cs config -p {id} -t <your-token>"));
    }
}
