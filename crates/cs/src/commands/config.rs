use crate::cli::ConfigArgs;
use crate::error::AppError;
use crate::output;
use crate::providers::{ProviderId, ProviderUpdate};
use crate::settings::CsSettings;

use super::Context;

impl From<&ConfigArgs> for ProviderUpdate {
    fn from(args: &ConfigArgs) -> Self {
        Self {
            base_url: args.url.clone(),
            auth_token: args.token.clone(),
            opus_model: args.opus.clone(),
            sonnet_model: args.sonnet.clone(),
            haiku_model: args.haiku.clone(),
        }
    }
}

/// `cs config -p <provider> ...`. With no field flags it shows the stored
/// configuration instead.
pub fn run(ctx: &Context, args: &ConfigArgs) -> Result<(), AppError> {
    let id: ProviderId = args.provider.parse()?;
    let update = ProviderUpdate::from(args);
    let mut settings = CsSettings::load(&ctx.paths)?;

    if update.is_empty() {
        output::info(&format!("Configuration for {id}"));
    } else {
        settings.update_provider(id, &update);
        settings.save(&ctx.paths)?;
        log::info!("Updated configuration for {id}");
        output::success(&format!("Updated configuration for {id}"));
    }

    let config = settings.provider(id);
    super::print_provider_details(&config);

    if !update.is_empty() && settings.current == id {
        output::info(&format!("Run 'cs {id}' to apply the changes"));
    }
    Ok(())
}
