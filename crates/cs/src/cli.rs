use clap::{ArgAction, Args, Parser, Subcommand};

const SWITCH_EXAMPLES: &str = "\
Examples:
  cs claude          Switch to Anthropic's API
  cs z               Switch to z.ai
  cs kimi --reset    Switch to Kimi and restore its default models
  cs config -p z -t <your-token>
  cs update list";

const CONFIG_EXAMPLES: &str = "\
Examples:
  cs config -p kimi -t sk-xxxx
  cs config -p z -u https://api.z.ai/api/anthropic -o glm-4.7 -h glm-4.5-air";

#[derive(Debug, Parser)]
#[command(
    name = "cs",
    about = "Claude provider switcher - switch between Claude-compatible API providers",
    args_conflicts_with_subcommands = true,
    disable_version_flag = true,
    after_help = SWITCH_EXAMPLES
)]
pub struct Cli {
    /// Provider to switch to (claude, claudible, jjuidev, kimi, z, minimax)
    #[arg(value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Restore the provider's default model names
    #[arg(long)]
    pub reset: bool,

    /// Print the version
    #[arg(short = 'V', long)]
    pub version: bool,

    /// Write debug logs to ~/.cs/debug.log
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Configure a provider's URL, token, or models
    Config(ConfigArgs),

    /// List providers and their configuration
    #[command(visible_alias = "ls")]
    List,

    /// Show the active provider
    Current,

    /// Remove the cs block from the shell startup file
    Unset,

    /// Update cs to the latest version, a specific version, or pick from `list`
    Update {
        /// Version to install, or `list`/`ls` to choose interactively
        #[arg(value_name = "VERSION")]
        target: Option<String>,
    },
}

#[derive(Debug, Args)]
#[command(disable_help_flag = true, after_help = CONFIG_EXAMPLES)]
pub struct ConfigArgs {
    /// Provider to configure
    #[arg(short, long)]
    pub provider: String,

    /// API token
    #[arg(short, long)]
    pub token: Option<String>,

    /// Base URL
    #[arg(short, long)]
    pub url: Option<String>,

    /// Opus model name
    #[arg(short, long)]
    pub opus: Option<String>,

    /// Sonnet model name
    #[arg(short, long)]
    pub sonnet: Option<String>,

    /// Haiku model name
    #[arg(short = 'h', long)]
    pub haiku: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

/// What `cs update` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    Latest,
    Pick,
    Version(String),
}

impl UpdateTarget {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Latest,
            Some("list" | "ls") => Self::Pick,
            Some(version) => Self::Version(version.to_string()),
        }
    }
}
