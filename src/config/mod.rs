mod types;

pub use types::*;

use crate::Result;
use std::{env, path::Path};
use tracing::{debug, warn};

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let mut config = load_from(&config_path).await?;
    config.apply_overrides(|key| env::var(key).ok());
    config.validate()?;

    Ok(config)
}

/// Reads a YAML configuration file. A missing file yields the defaults.
pub async fn load_from(config_path: &str) -> Result<Config> {
    if !Path::new(config_path).exists() {
        warn!(
            "Configuration file {} not found, using defaults",
            config_path
        );
        return Ok(Config::default());
    }

    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(config_path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}
