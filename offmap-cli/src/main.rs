//! offmap CLI - Command-line interface
//!
//! Download San Francisco map areas, keep them in the local store, and render
//! or ask about them offline.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use offmap::config::{config_file_path, ConfigFile};
use offmap::logging::init_logging;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "offmap", version, about = "Offline maps for San Francisco neighborhoods")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the map areas available for download
    Areas,

    /// Download an area for offline use
    Download {
        /// Area id (see `offmap areas`)
        area: String,

        /// Zoom level to download (overrides tiles.zoom)
        #[arg(long)]
        zoom: Option<u8>,
    },

    /// List downloaded maps
    List,

    /// Delete a downloaded map
    Delete {
        /// Area id
        area: String,
    },

    /// Delete every downloaded map
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show storage usage
    Stats,

    /// Render a downloaded map to a PNG file
    Render {
        /// Area id
        area: String,

        /// Output file (defaults to <area>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Canvas extent: cropped or world (overrides compositor.extent)
        #[arg(long)]
        extent: Option<String>,
    },

    /// Ask the assistant about an area
    Ask {
        /// Area id
        area: String,

        /// Question; starts an interactive chat when omitted
        question: Option<String>,
    },

    /// Sign in with an identity token
    Login {
        /// Identity token; prompted for when omitted
        token: Option<String>,
    },

    /// Sign out
    Logout,

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.display();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);

    // Config commands must work even when the file does not parse.
    if let Commands::Config(command) = cli.command {
        return commands::config::run(command, &config_path);
    }

    let mut config = ConfigFile::load_from(&config_path)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    let _log_guard = init_logging(&config.logging)?;
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Areas => commands::areas::run(&config),
        Commands::Download { area, zoom } => commands::download::run(&config, &area, zoom).await,
        Commands::List => commands::maps::list(&config),
        Commands::Delete { area } => commands::maps::delete(&config, &area),
        Commands::Clear { yes } => commands::maps::clear(&config, yes),
        Commands::Stats => commands::maps::stats(&config),
        Commands::Render {
            area,
            output,
            extent,
        } => commands::render::run(&config, &area, output, extent.as_deref()),
        Commands::Ask { area, question } => {
            commands::ask::run(&config, &area, question.as_deref()).await
        }
        Commands::Login { token } => commands::auth::login(&config, token),
        Commands::Logout => commands::auth::logout(&config),
        Commands::Config(_) => Ok(()),
    }
}
