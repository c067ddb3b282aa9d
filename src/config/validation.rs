//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse human-readable sizes and retention windows
//! - Validate value ranges (timeouts > 0, sizes > 0)
//! - Detect file groups that would collide on disk
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - A missing notification URL is not an error here; it surfaces when a
//!   notification is attempted

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::logging::rotating::Retention;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid size '{value}' for {field}")]
    InvalidSize { field: &'static str, value: String },

    #[error("invalid retention '{0}' for logging.max_files")]
    InvalidRetention(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("file group '{0}' is configured more than once")]
    DuplicateFile(String),

    #[error("invalid notify.url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),
}

/// Parse a size such as `"20m"`, `"512k"`, `"1g"` or `"1048576"` into bytes.
///
/// Units are binary (k = 1024). Zero is rejected.
pub fn parse_size(value: &str) -> Option<u64> {
    let trimmed = value.trim().to_ascii_lowercase();
    let (digits, multiplier) = match trimmed.chars().last()? {
        'k' => (&trimmed[..trimmed.len() - 1], 1024),
        'm' => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
        'g' => (&trimmed[..trimmed.len() - 1], 1024 * 1024 * 1024),
        _ => (trimmed.as_str(), 1),
    };
    let count: u64 = digits.trim().parse().ok()?;
    count.checked_mul(multiplier).filter(|bytes| *bytes > 0)
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let logging = &config.logging;
    if logging.dir.trim().is_empty() {
        errors.push(ValidationError::Empty("logging.dir"));
    }

    if parse_size(&logging.max_size).is_none() {
        errors.push(ValidationError::InvalidSize {
            field: "logging.max_size",
            value: logging.max_size.clone(),
        });
    }

    if logging.max_files.parse::<Retention>().is_err() {
        errors.push(ValidationError::InvalidRetention(logging.max_files.clone()));
    }

    let mut seen = HashSet::new();
    for (field, name) in [
        ("logging.access_file", &logging.access_file),
        ("logging.app_file", &logging.app_file),
        ("logging.error_file", &logging.error_file),
    ] {
        if name.trim().is_empty() {
            errors.push(ValidationError::Empty(field));
        } else if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateFile(name.clone()));
        }
    }

    if let Some(raw) = &config.notify.url {
        match url::Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => errors.push(ValidationError::InvalidUrl {
                url: raw.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                url: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.notify.timeout_secs == 0 {
        errors.push(ValidationError::Zero("notify.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
