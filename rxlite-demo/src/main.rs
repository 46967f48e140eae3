//! rxlite walkthrough
//!
//! Runs the reactive core through native events, array sequences, a
//! hand-built Observable recovered with `catch_error`, and deferred values.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod demos;
mod sink;

use config::{DemoConfig, LogFormat, LoggingConfig};

#[derive(Parser)]
#[command(name = "rxlite-demo")]
#[command(about = "Walkthrough of the rxlite reactive core", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Observe synthetic click, keyup and mousemove events
    Events,

    /// Observe the configured numbers and posts
    Array,

    /// Hand-built Observable that errors and recovers
    Scratch,

    /// Promise resolved after a delay, then a user lookup
    Promise,

    /// Run every walkthrough in order
    All,
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&logging.level)
                .with_context(|| format!("Invalid log level '{}'", logging.level))?,
        }
    };

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DemoConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DemoConfig::default(),
    };
    init_logging(&config.logging, cli.verbose)?;

    info!("rxlite demo v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Events => demos::events(&config.events),
        Commands::Array => demos::array(&config.array),
        Commands::Scratch => demos::scratch(&config.scratch)
            .await
            .context("Scratch walkthrough failed")?,
        Commands::Promise => demos::promise(&config.promise)
            .await
            .context("Promise walkthrough failed")?,
        Commands::All => {
            demos::events(&config.events);
            demos::array(&config.array);
            demos::scratch(&config.scratch)
                .await
                .context("Scratch walkthrough failed")?;
            demos::promise(&config.promise)
                .await
                .context("Promise walkthrough failed")?;
        }
    }

    info!("Walkthrough finished");
    Ok(())
}
