//! # divelog
//!
//! Command-line entry point: import a Subsurface export and either serve
//! the read-only JSON API or print an import summary.
//!
//! ## Usage
//!
//! ```bash
//! # Import and serve
//! divelog serve --db mydives.xml --bind 127.0.0.1:8072
//!
//! # Validate an export and print what it contains
//! divelog check mydives.xml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use divelog::builder;
use divelog::config::Config;
use divelog::server::{self, AppState};

/// divelog - Subsurface dive-log importer and read-only API server
#[derive(Parser)]
#[command(name = "divelog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the configured export and serve the JSON API
    Serve {
        /// Path of the Subsurface XML export
        #[arg(long)]
        db: Option<PathBuf>,

        /// Address to bind, e.g. 127.0.0.1:8072
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Optional TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Import an export file and print a summary
    Check {
        /// Path of the Subsurface XML export
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Serve { db, bind, config } => {
            let config = Config::resolve(db, bind, config.as_deref())?;

            let log = builder::import_file(&config.source).with_context(|| {
                format!("failed to import {}", config.source.display())
            })?;
            info!(
                "imported {}: {} sites, {} trips, {} dives",
                config.source.display(),
                log.highest_site_id(),
                log.highest_trip_id(),
                log.highest_dive_id()
            );

            let state = AppState::new(log, config.source.clone());
            server::serve(state, config.bind)
                .await
                .with_context(|| format!("server failed on {}", config.bind))?;
        }

        Commands::Check { file } => {
            let log = builder::import_file(&file)
                .with_context(|| format!("failed to import {}", file.display()))?;

            println!("Source:  {}", file.display());
            println!(
                "Program: {} {}",
                log.metadata().program,
                log.metadata().program_version
            );
            println!("Units:   {}", log.metadata().units);
            println!("Sites:   {}", log.highest_site_id());
            println!("Trips:   {}", log.highest_trip_id());
            println!("Dives:   {}", log.highest_dive_id());
        }
    }

    Ok(())
}
