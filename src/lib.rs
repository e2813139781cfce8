//! Monitoring integration for axum services and background jobs.
//!
//! Wraps requests and jobs in transactions, turns database statements into
//! spans, attaches request and user context to error events, and renders the
//! browser SDK snippet. Transport, sampling and storage stay with the
//! `sentry` client.

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod snippet;
pub mod worker;

pub use config::{AppConfig, SentrySettings};
pub use db::{ConnectionInfo, Execute, QueryTracer, Statement, Traced};
pub use http::{sentry_middleware, RouteMatch};
pub use lifecycle::{init, SentryGuard};
pub use monitor::{Identity, Monitor, MonitorScope, UserIdentity};
pub use snippet::{Snippet, SnippetRenderer, TemplateContext};
pub use worker::Job;
