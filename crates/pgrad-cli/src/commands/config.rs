//! Configuration management commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use crate::config::{Config, CONFIG_FILE_NAME};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config: &Config, source: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config, source),
        ConfigCommands::Init { force } => init(Path::new(CONFIG_FILE_NAME), force),
    }
}

fn show(config: &Config, source: Option<&Path>) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    match source {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("No configuration file found. Using defaults.\n"),
    }
    println!("{}", config.to_toml()?);

    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, Config::default().to_toml()?)?;
    println!("Configuration file created: {}", path.display());

    Ok(())
}
