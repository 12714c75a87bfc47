//! Configuration loading for the pgrad CLI

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use pgrad_rl::envs::CartPoleConfig;
use pgrad_rl::{PolicyConfig, TrainerConfig};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "pgrad.toml";

/// Configuration for a training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trainer: TrainerConfig,
    pub policy: PolicyConfig,
    pub cartpole: CartPoleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from `path` (if any) and `PGRAD__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PGRAD")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Find the configuration file.
    ///
    /// Checks in order: the explicit path, `$PGRAD_CONFIG`, `./pgrad.toml`,
    /// `~/.config/pgrad/pgrad.toml`. An explicit path must exist.
    pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Ok(Some(path.to_path_buf()));
        }

        if let Ok(path) = std::env::var("PGRAD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok(Some(local));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("pgrad").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        Ok(None)
    }

    pub fn validate(&self) -> Result<()> {
        self.trainer.validate()?;
        self.policy.validate()?;
        self.cartpole.validate()?;
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
