//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides from the process environment.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;
    finish(config)
}

/// Build configuration from defaults plus the process environment.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    finish(ServiceConfig::default())
}

fn finish(mut config: ServiceConfig) -> Result<ServiceConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto a configuration.
///
/// Recognized keys: `NOTIFY_SERVICE_URL`, `NOTIFY_SERVICE_USER`, `PORT`, `LOG_DIR`.
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("NOTIFY_SERVICE_URL") {
        config.notify.url = Some(url);
    }
    if let Some(user) = get("NOTIFY_SERVICE_USER") {
        config.notify.user = Some(user);
    }
    if let Some(port) = get("PORT") {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port.trim());
    }
    if let Some(dir) = get("LOG_DIR") {
        config.logging.dir = dir;
    }
}
