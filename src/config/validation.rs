//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, port non-zero)
//! - Check addresses parse before anything binds them
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Longest accepted reload interval (one day).
pub const MAX_RELOAD_INTERVAL_SECS: u64 = 86_400;

/// A single semantic problem with the server settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroPort,

    #[error("resources.path must not be empty")]
    EmptyResourcePath,

    #[error("resources.reload_interval_secs must be greater than zero")]
    ZeroReloadInterval,

    #[error("resources.reload_interval_secs must be at most {MAX_RELOAD_INTERVAL_SECS}, got {0}")]
    ReloadIntervalTooLong(u64),

    #[error("http.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Check the settings, collecting every violation.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.resources.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyResourcePath);
    }
    match config.resources.reload_interval_secs {
        0 => errors.push(ValidationError::ZeroReloadInterval),
        secs if secs > MAX_RELOAD_INTERVAL_SECS => {
            errors.push(ValidationError::ReloadIntervalTooLong(secs))
        }
        _ => {}
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
