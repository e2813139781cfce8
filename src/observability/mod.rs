//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Crate and host code emit `tracing` events
//!     → logging.rs (fmt layer: stdout, pretty or JSON)
//!     → sentry tracing layer (breadcrumbs, error events)
//! ```

pub mod logging;

pub use logging::init_logging;
