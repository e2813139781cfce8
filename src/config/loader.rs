//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{AppConfig, SentrySettings, UserContextMode};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// `SENTRY_*` variables present in the environment take precedence over
/// the file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&content)?;

    config.sentry.apply_overrides(|key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build configuration from defaults and the environment only.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let config = AppConfig {
        sentry: SentrySettings::from_env()?,
        ..AppConfig::default()
    };
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

impl SentrySettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        settings.apply_overrides(lookup)?;
        Ok(settings)
    }

    /// Overwrite every field whose variable `lookup` returns.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SENTRY_DSN") {
            self.dsn = v;
        }
        if let Some(v) = lookup("SENTRY_AUTO_INIT") {
            self.auto_init = parse_flag(&v);
        }
        if let Some(v) = lookup("SENTRY_RELEASE") {
            self.release = v;
        }
        if let Some(v) = lookup("SENTRY_ENVIRONMENT") {
            self.environment = v;
        }
        if let Some(v) = lookup("SENTRY_PII_ENABLED") {
            self.pii_enabled = parse_flag(&v);
        }
        if let Some(v) = lookup("SENTRY_TRACES_SAMPLE_RATE") {
            self.traces_sample_rate = parse_env("SENTRY_TRACES_SAMPLE_RATE", &v)?;
        }
        if let Some(v) = lookup("SENTRY_PROFILES_SAMPLE_RATE") {
            self.profiles_sample_rate = parse_env("SENTRY_PROFILES_SAMPLE_RATE", &v)?;
        }
        if let Some(v) = lookup("SENTRY_INIT_OPTIONS") {
            self.init_options =
                serde_json::from_str(&v).map_err(|e| ConfigError::Env {
                    var: "SENTRY_INIT_OPTIONS",
                    value: v.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(v) = lookup("SENTRY_USER_CONTEXT") {
            self.user_context = match v.trim().to_lowercase().as_str() {
                "scope" => UserContextMode::Scope,
                "event_processor" => UserContextMode::EventProcessor,
                _ => {
                    return Err(ConfigError::Env {
                        var: "SENTRY_USER_CONTEXT",
                        value: v,
                        reason: "expected `scope` or `event_processor`".to_string(),
                    })
                }
            };
        }
        if let Some(v) = lookup("SENTRY_REQUEST_BODY_LIMIT") {
            self.request_body_limit = parse_env("SENTRY_REQUEST_BODY_LIMIT", &v)?;
        }
        Ok(())
    }
}

/// `true`, `1` and `yes` (any case) are true; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
