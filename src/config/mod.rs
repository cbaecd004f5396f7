//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<NimbusConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let config: NimbusConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("invalid config file {:?}", path))?;
    info!("loaded configuration from {:?}", path);
    Ok(config)
}

/// Load configuration, or use the defaults when the file does not exist
pub fn load_or_default(path: &Path) -> Result<NimbusConfig> {
    if path.exists() {
        load_config(path)
    } else {
        info!("no config at {:?}, using defaults", path);
        Ok(NimbusConfig::default())
    }
}
