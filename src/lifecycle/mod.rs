//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Initialize monitoring client → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Graceful shutdown → client guard dropped (flush)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging, then the client
//! - The client guard outlives the server so in-flight events are flushed

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::{client_options, init, InitError, SentryGuard};
