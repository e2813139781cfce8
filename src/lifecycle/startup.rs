//! Client initialization.
//!
//! # Responsibilities
//! - Translate `SentrySettings` into client options
//! - Apply passthrough options verbatim
//! - Construct the client at most once per process
//!
//! # Design Decisions
//! - Fail fast: any option error is fatal at startup
//! - No retry; transport problems are the client's concern

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sentry::types::Dsn;
use sentry::ClientOptions;
use serde_json::Value;
use thiserror::Error;

use crate::config::SentrySettings;

pub use sentry::ClientInitGuard as SentryGuard;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Options that have a first-class setting and may not be passed through.
const RESERVED_OPTIONS: &[&str] = &[
    "dsn",
    "release",
    "environment",
    "send_default_pii",
    "traces_sample_rate",
    "profiles_sample_rate",
];

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid dsn: {0}")]
    Dsn(#[from] sentry::types::ParseDsnError),

    #[error("unknown init option `{0}`")]
    UnknownOption(String),

    #[error("init option `{0}` duplicates a first-class setting")]
    ReservedOption(String),

    #[error("init option `{key}` expects {expected}, got {value}")]
    InvalidOption {
        key: String,
        expected: &'static str,
        value: Value,
    },

    #[error("monitoring client already initialized")]
    AlreadyInitialized,
}

/// Initialize the client if an endpoint is configured and auto-init is on.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes pending events.
pub fn init(settings: &SentrySettings) -> Result<Option<SentryGuard>, InitError> {
    if !settings.is_enabled() || !settings.auto_init {
        tracing::info!(
            enabled = settings.is_enabled(),
            auto_init = settings.auto_init,
            "Monitoring client not initialized"
        );
        return Ok(None);
    }

    let options = client_options(settings)?;

    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(InitError::AlreadyInitialized);
    }

    if settings.profiles_sample_rate > 0.0 {
        tracing::warn!(
            profiles_sample_rate = settings.profiles_sample_rate,
            "Profiling is not supported by this client; rate ignored"
        );
    }

    let guard = sentry::init(options);
    tracing::info!(
        environment = %settings.environment,
        release = settings.release().unwrap_or("-"),
        traces_sample_rate = settings.traces_sample_rate,
        enabled = guard.is_enabled(),
        "Monitoring client initialized"
    );
    Ok(Some(guard))
}

/// Client options for `settings`, passthrough options applied last.
pub fn client_options(settings: &SentrySettings) -> Result<ClientOptions, InitError> {
    let dsn = if settings.is_enabled() {
        Some(settings.dsn.parse::<Dsn>()?)
    } else {
        None
    };

    let mut options = ClientOptions {
        dsn,
        release: settings.release().map(|r| Cow::Owned(r.to_string())),
        environment: Some(Cow::Owned(settings.environment.clone())),
        send_default_pii: settings.pii_enabled,
        traces_sample_rate: settings.traces_sample_rate as f32,
        ..ClientOptions::default()
    };

    for (key, value) in &settings.init_options {
        apply_option(&mut options, key, value)?;
    }
    Ok(options)
}

fn apply_option(options: &mut ClientOptions, key: &str, value: &Value) -> Result<(), InitError> {
    if RESERVED_OPTIONS.contains(&key) {
        return Err(InitError::ReservedOption(key.to_string()));
    }

    let invalid = |expected| InitError::InvalidOption {
        key: key.to_string(),
        expected,
        value: value.clone(),
    };

    match key {
        "server_name" => {
            let name = value.as_str().ok_or_else(|| invalid("a string"))?;
            options.server_name = Some(Cow::Owned(name.to_string()));
        }
        "sample_rate" => {
            let rate = value
                .as_f64()
                .filter(|r| (0.0..=1.0).contains(r))
                .ok_or_else(|| invalid("a number within [0, 1]"))?;
            options.sample_rate = rate as f32;
        }
        "max_breadcrumbs" => {
            let max = value.as_u64().ok_or_else(|| invalid("a non-negative integer"))?;
            options.max_breadcrumbs = max as usize;
        }
        "attach_stacktrace" => {
            options.attach_stacktrace = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
        }
        "debug" => {
            options.debug = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
        }
        "default_integrations" => {
            options.default_integrations = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
        }
        "shutdown_timeout" => {
            let secs = value
                .as_f64()
                .filter(|s| *s >= 0.0 && s.is_finite())
                .ok_or_else(|| invalid("a non-negative number of seconds"))?;
            options.shutdown_timeout = Duration::from_secs_f64(secs);
        }
        _ => return Err(InitError::UnknownOption(key.to_string())),
    }
    Ok(())
}
