use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod client;
mod core;
mod daemon;

use crate::core::models::ToggleRequest;
use crate::core::settings::Settings;

#[derive(Parser)]
#[command(name = "maintenance-watch")]
#[command(author, version, about = "Watch and toggle the site's maintenance mode")]
struct Cli {
    /// Path to the config file (default: ~/.config/maintenance-watch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll maintenance status and log every change
    Watch,

    /// Show current maintenance status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Skip the cache and fail if the server cannot be reached
        #[arg(long)]
        force: bool,
    },

    /// Turn maintenance mode on
    Enable {
        /// Message shown to visitors (max 500 characters)
        #[arg(long, short)]
        message: Option<String>,

        /// Estimated duration in minutes
        #[arg(long, short)]
        duration: Option<i64>,
    },

    /// Turn maintenance mode off
    Disable,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config_path = Settings::resolve_path(cli.config.as_deref())?;
    let settings = Settings::load_from(&config_path)?;
    init_logging(settings.debug, cli.json_logs);

    if config_path.exists() {
        tracing::info!(path = ?config_path, "Loaded config");
    } else {
        tracing::info!(path = ?config_path, "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Watch => daemon::run(&settings).await,
        Commands::Status { json, force } => cli::status::run(&settings, json, force).await,
        Commands::Enable { message, duration } => {
            cli::toggle::run(&settings, ToggleRequest::enable(message, duration)).await
        }
        Commands::Disable => cli::toggle::run(&settings, ToggleRequest::disable()).await,
        Commands::Completions { .. } => Ok(()),
    }
}
