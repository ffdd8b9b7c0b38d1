use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glossa")]
#[command(about = "Glossa - look words up across dictionaries")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  glossa list                          List the available dictionaries
  glossa search youdao love            Look a word up in one dictionary
  glossa search --all \"take off\"       Look a word up in every selected dictionary
  glossa config show                   Show the stored configuration

\x1b[1;36mMaintenance:\x1b[0m
  glossa config reset                  Write the default configuration
  glossa install --previous-version 4.2.0
                                       Run the update migration by hand")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true, env = "GLOSSA_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Disable colored log output (stderr); use --output text for plain results
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registered dictionaries
    #[command(alias = "ls")]
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  glossa list                    Show all dictionaries
  glossa list --output json      Output as JSON")]
    List,

    /// Look text up through the background message router
    ///
    /// With a dictionary name the lookup goes to that dictionary only. With
    /// --all every dictionary selected in the stored configuration is asked
    /// concurrently and answers are shown as they arrive.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  glossa search youdao love
  glossa search urban yeet --output json
  glossa search --all \"fall in love\"")]
    Search {
        /// Dictionary id, or the text itself when --all is given
        dict_or_text: String,
        /// Text to look up
        text: Option<String>,
        /// Ask every selected dictionary
        #[arg(short, long)]
        all: bool,
    },

    /// Inspect or reset the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run install/update handling against the local storage
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  glossa install                              Fresh install
  glossa install --previous-version 4.2.0     Update from 4.x (resets storage)
  glossa install --previous-version 5.1.0     Update from 5.x (no change)")]
    Install {
        /// Why the handler runs
        #[arg(long, value_enum)]
        reason: Option<ReasonArg>,
        /// Version being updated from
        #[arg(long)]
        previous_version: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show the stored configuration and the one each dictionary uses
    Show,
    /// Overwrite the stored configuration with the defaults
    Reset,
    /// Print the settings file and data directory locations
    Path,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReasonArg {
    Install,
    Update,
    BrowserUpdate,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// Human-readable output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}
