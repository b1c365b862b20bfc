use crate::error::AppError;
use crate::output;
use crate::settings::CsSettings;

use super::Context;

pub fn run(ctx: &Context) -> Result<(), AppError> {
    let settings = CsSettings::load(&ctx.paths)?;
    let id = settings.current;
    let config = settings.provider(id);

    output::info(&format!("Current provider: {id}"));
    super::print_provider_details(&config);
    super::warn_missing_token(id, &config);
    Ok(())
}
