//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → SENTRY_* environment variables override
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → SentrySettings shared via Arc with the middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so an empty environment is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AppConfig, ListenerConfig, LogFormat, ObservabilityConfig, SentrySettings, UserContextMode,
};
pub use validation::{validate_config, ValidationError};
