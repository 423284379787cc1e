//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hud_core::config::{HudConfig, paths};
use hud_core::logging::{self, LogTarget};

mod commands;

#[derive(Parser)]
#[command(name = "hud")]
#[command(version)]
#[command(about = "Overlay HUD presentation demo and tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file to use instead of $HUD_HOME/config.toml
    #[arg(long, global = true, env = "HUD_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the interactive terminal demo (default)
    Demo,
    /// Run a scripted session on a virtual clock and print every HUD event
    Simulate {
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Write the default config file (if not present)
    Init,
    /// Print the default config with every key
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(paths::config_path);

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            let _log = logging::init(LogTarget::File(paths::logs_dir()))?;
            let config = HudConfig::load_from(&config_path)?;
            commands::demo::run(config)
        }
        Commands::Simulate { json } => {
            let _log = logging::init(LogTarget::Stderr)?;
            let config = HudConfig::load_from(&config_path)?;
            commands::simulate::run(config, json)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}
