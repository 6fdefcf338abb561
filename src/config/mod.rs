mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub async fn load() -> Result<Config> {
    let explicit_path = env::var("CONFIG_PATH").ok();
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if explicit_path.is_none() && !Path::new(&config_path).exists() {
        debug!("No {} found, using built-in defaults", config_path);
        Config::default()
    } else {
        load_from_path(&config_path).await?
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Reads and parses a YAML file without applying overrides or validation.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());
    let config_str = tokio::fs::read_to_string(path).await?;
    parse(&config_str)
}

pub fn parse(yaml: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Applies `GEMINI_API_KEY`, `MODEL`, `HOST` and `PORT` on top of the file values.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(api_key) = lookup("GEMINI_API_KEY").filter(|v| !v.is_empty()) {
        config.model.api_key = api_key;
    }
    if let Some(model) = lookup("MODEL").filter(|v| !v.is_empty()) {
        config.model.model = model;
    }
    if let Some(host) = lookup("HOST").filter(|v| !v.is_empty()) {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
        config.server.port = port
            .parse()
            .map_err(|_| Error::config(format!("PORT is not a valid port number: '{}'", port)))?;
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<()> {
    if config.model.api_key.trim().is_empty() {
        return Err(Error::config(
            "model.api_key is empty (set it in the config file or GEMINI_API_KEY)",
        ));
    }
    if config.model.model.trim().is_empty() {
        return Err(Error::config("model.model must name a model"));
    }

    let limits = &config.limits;
    if limits.per_client_max == 0 || limits.global_max == 0 {
        return Err(Error::config("rate limits must be greater than zero"));
    }
    if limits.per_client_window_secs == 0 || limits.global_window_secs == 0 {
        return Err(Error::config("rate limit windows must be greater than zero"));
    }
    Ok(())
}
