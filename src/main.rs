use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use racecard::config::Config;
use racecard::error::RacecardErrorTrait;

mod commands;

#[derive(Parser)]
#[command(
    name = "racecard",
    version,
    about = "Race prediction viewer with fallback manifest resolution",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the race card page
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Export the race card as a static site
    Export {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the manifest and list its races
    Races,

    /// Print the race that a selection key resolves to
    Show {
        /// Selection key; unknown or missing keys fall back to the first race
        #[arg(short, long)]
        race_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .map_err(racecard::Error::from)
        .context("Failed to load configuration")?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("racecard starting");

    if let Err(err) = run(cli.command, config).await {
        if let Some(e) = racecard::Error::find_in(&err) {
            tracing::error!(
                category = e.category().description(),
                recoverable = e.is_recoverable(),
                "{}",
                e.user_message()
            );
        }
        return Err(err);
    }

    tracing::info!("racecard completed successfully");
    Ok(())
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Serve { host, port } => {
            tracing::info!(host = ?host, port = ?port, "Starting serve command");
            commands::serve(config, host, port).await
        }

        Commands::Export { output } => {
            tracing::info!(output = ?output, "Starting export command");
            commands::export(config, output).await
        }

        Commands::Races => {
            tracing::info!("Starting races command");
            commands::races(config).await
        }

        Commands::Show { race_id } => {
            tracing::info!(race_id = ?race_id, "Starting show command");
            commands::show(config, race_id).await
        }
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("racecard=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("racecard={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
