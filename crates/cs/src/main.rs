mod claude_settings;
mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod providers;
mod settings;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use cs_platform::AppPaths;

use crate::cli::{Cli, Commands, UpdateTarget};
use crate::commands::Context;
use crate::error::AppError;
use crate::settings::CsSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The updater compares this output verbatim, so keep it bare.
    if cli.version {
        println!("{}", commands::update::CURRENT_VERSION);
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            log::error!("{error}");
            output::error(&error.to_string());
            if let Some(hint) = error.hint() {
                output::info(&hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let paths = AppPaths::new()?;
    let debug_logging = cli.debug || CsSettings::load(&paths)?.debug_logging;
    logging::init_logging(&paths, debug_logging);

    let ctx = Context {
        paths,
        shell: cs_shell::detect_shell(),
    };

    match cli.command {
        Some(Commands::Config(args)) => commands::config::run(&ctx, &args)?,
        Some(Commands::List) => commands::list::run(&ctx)?,
        Some(Commands::Current) => commands::current::run(&ctx)?,
        Some(Commands::Unset) => commands::unset::run(&ctx)?,
        Some(Commands::Update { target }) => {
            return commands::update::run(&ctx, UpdateTarget::from_arg(target.as_deref())).await;
        }
        None if cli.provider.is_none() && !cli.reset => Cli::command().print_help()?,
        None => commands::switch::run(&ctx, cli.provider.as_deref(), cli.reset)?,
    }

    Ok(ExitCode::SUCCESS)
}
