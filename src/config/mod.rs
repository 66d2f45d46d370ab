mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the configuration named by `CONFIG_PATH` (default `config.yaml`).
///
/// A missing default file yields the built-in defaults; a missing file that was
/// named explicitly is an error. `MODEL_DIR` overrides `model.directory`.
pub async fn load() -> Result<Config> {
    let explicit = env::var("CONFIG_PATH").ok();
    let config_path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));

    let mut config = if explicit.is_none() && !config_path.exists() {
        Config::default()
    } else {
        load_from(&config_path).await?
    };

    if let Ok(dir) = env::var("MODEL_DIR") {
        config.model.directory = PathBuf::from(dir);
    }

    config.validate()?;
    Ok(config)
}

pub async fn load_from(path: &Path) -> Result<Config> {
    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config("server.port must be greater than 0"));
        }
        self.generation.validate()
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(Error::config("generation.max_length must be greater than 0"));
        }
        if self.max_input_tokens == 0 {
            return Err(Error::config(
                "generation.max_input_tokens must be greater than 0",
            ));
        }
        if self.top_k == 0 {
            return Err(Error::config("generation.top_k must be greater than 0"));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(Error::config(format!(
                "generation.top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if !(self.temperature > 0.0) {
            return Err(Error::config(format!(
                "generation.temperature must be greater than 0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}
