//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sample rates, body limit)
//! - Check the endpoint identifier parses before the client sees it
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use sentry::types::Dsn;
use thiserror::Error;

use crate::config::schema::{AppConfig, SentrySettings};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    SampleRateOutOfRange { field: &'static str, value: f64 },

    #[error("dsn is not a valid endpoint identifier: {0}")]
    InvalidDsn(String),

    #[error("environment must not be empty")]
    EmptyEnvironment,

    #[error("request_body_limit must be greater than zero")]
    ZeroBodyLimit,

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),
}

/// Validate the whole application configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_settings(&config.sentry);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the monitoring settings alone.
pub fn validate_settings(settings: &SentrySettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("traces_sample_rate", settings.traces_sample_rate),
        ("profiles_sample_rate", settings.profiles_sample_rate),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::SampleRateOutOfRange { field, value });
        }
    }

    if settings.is_enabled() {
        if let Err(e) = settings.dsn.parse::<Dsn>() {
            errors.push(ValidationError::InvalidDsn(e.to_string()));
        }
    }

    if settings.environment.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironment);
    }

    if settings.request_body_limit == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    errors
}
