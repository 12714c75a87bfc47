//! pgrad CLI - Command line interface for the policy-gradient trainer
//!
//! Trains the reference linear softmax policy on cart-pole and manages the
//! configuration file.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::float_cmp)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{config as config_cmd, train};
use crate::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "pgrad")]
#[command(author, version, about = "pgrad - episodic policy-gradient trainer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./pgrad.toml or ~/.config/pgrad/pgrad.toml)
    #[arg(short, long, global = true, env = "PGRAD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the reference policy on cart-pole
    Train(train::TrainArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let log_level = if verbose { "debug" } else { logging.level.as_str() };

    let json = logging.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("pgrad={log_level},pgrad_rl={log_level}").into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let source = Config::find_config_file(cli.config.as_deref())?;
    let config = Config::load(source.as_deref())?;

    init_logging(&config.logging, cli.verbose);
    match &source {
        Some(path) => info!("Loaded config from: {:?}", path),
        None => info!("No config file found, using defaults"),
    }

    match cli.command {
        Commands::Train(args) => train::run(args, config),
        Commands::Config(cmd) => config_cmd::run(cmd, &config, source.as_deref()),
    }
}
