//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the integration and
//! for the demo application that hosts it. All types derive Serde traits for
//! deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::ConnectionInfo;

/// Root configuration for an application using the integration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Monitoring client settings.
    pub sentry: SentrySettings,

    /// Database the query spans describe. `None` means no database.
    pub database: Option<ConnectionInfo>,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Where the authenticated user is attached during a request.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserContextMode {
    /// Set the user on the request scope once the handler has returned.
    #[default]
    Scope,
    /// Attach the user inside the request's event processor.
    EventProcessor,
}

/// Monitoring client settings, read once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SentrySettings {
    /// Endpoint identifier. Empty disables monitoring.
    pub dsn: String,

    /// Construct the client automatically at startup.
    pub auto_init: bool,

    /// Release label. Empty means unset.
    pub release: String,

    /// Environment label.
    pub environment: String,

    /// Include email, username and request bodies.
    pub pii_enabled: bool,

    pub traces_sample_rate: f64,

    pub profiles_sample_rate: f64,

    /// Extra client options, applied verbatim at initialization.
    pub init_options: BTreeMap<String, serde_json::Value>,

    pub user_context: UserContextMode,

    /// Largest request body (bytes) buffered for error events.
    pub request_body_limit: usize,
}

impl SentrySettings {
    /// Whether an endpoint is configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.dsn.is_empty()
    }

    /// Release label, `None` when unset.
    pub fn release(&self) -> Option<&str> {
        Some(self.release.as_str()).filter(|r| !r.is_empty())
    }
}

impl Default for SentrySettings {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            auto_init: true,
            release: String::new(),
            environment: "production".to_string(),
            pii_enabled: true,
            traces_sample_rate: 0.0,
            profiles_sample_rate: 0.0,
            init_options: BTreeMap::new(),
            user_context: UserContextMode::Scope,
            request_body_limit: 10 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Forward `tracing` events to the monitoring client.
    pub forward_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            forward_logs: true,
        }
    }
}
