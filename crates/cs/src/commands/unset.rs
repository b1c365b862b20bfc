use crate::error::AppError;
use crate::output;

use super::Context;

/// Removes the managed export block. The settings file is left alone so the
/// next `cs <provider>` restores everything.
pub fn run(ctx: &Context) -> Result<(), AppError> {
    let path = &ctx.shell.startup_file;
    if cs_shell::remove_block(path)? {
        output::success(&format!("Removed cs exports from {}", path.display()));
        output::info(&ctx.shell.reload_hint());
    } else {
        output::info(&format!("No cs exports found in {}", path.display()));
    }
    Ok(())
}
