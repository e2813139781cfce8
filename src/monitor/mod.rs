//! Monitoring core shared by the request and job middleware.
//!
//! # Data Flow
//! ```text
//! Monitor (settings + optional database, shared)
//!     → isolate() forks a fresh Hub per request/job, scope cleared
//!     → TransactionGuard opens the transaction on that hub
//!     → MonitorScope hands hub, transaction, query tracer to the work
//!     → TransactionGuard finishes exactly once
//! ```
//!
//! # Design Decisions
//! - No ambient scope mutation: every unit of work owns its hub
//! - Enrichment runs through best-effort combinators (enrich.rs)
//! - Errors from the monitored work are never intercepted

pub mod enrich;
pub mod identity;
pub mod scope;
pub mod transaction;

use std::sync::Arc;

use sentry::protocol::{Context, Map, Value};
use sentry::{Hub, TransactionOrSpan};

use crate::config::{AppConfig, SentrySettings};
use crate::db::{ConnectionInfo, QueryTracer};

pub use enrich::{best_effort, enrichment};
pub use identity::{Identity, UserIdentity};
pub use scope::MonitorScope;
pub use transaction::{status_for_http, TransactionGuard};

/// Shared, read-only monitoring state.
#[derive(Debug, Clone)]
pub struct Monitor {
    settings: Arc<SentrySettings>,
    database: Option<Arc<ConnectionInfo>>,
}

impl Monitor {
    pub fn new(settings: SentrySettings) -> Self {
        Self {
            settings: Arc::new(settings),
            database: None,
        }
    }

    /// Monitor for a loaded application config.
    pub fn from_config(config: &AppConfig) -> Self {
        let monitor = Self::new(config.sentry.clone());
        match &config.database {
            Some(info) => monitor.with_database(info.clone()),
            None => monitor,
        }
    }

    /// Emit query spans for this database.
    pub fn with_database(mut self, info: ConnectionInfo) -> Self {
        self.database = Some(Arc::new(info));
        self
    }

    pub fn settings(&self) -> &SentrySettings {
        &self.settings
    }

    pub fn database(&self) -> Option<&Arc<ConnectionInfo>> {
        self.database.as_ref()
    }

    /// Fork a hub for one unit of work and clear its scope.
    pub(crate) fn isolate(&self) -> Arc<Hub> {
        let hub = Arc::new(Hub::new_from_top(Hub::current()));
        hub.configure_scope(|scope| scope.clear());
        hub
    }

    pub(crate) fn query_tracer(
        &self,
        hub: &Arc<Hub>,
        parent: Option<TransactionOrSpan>,
    ) -> Option<QueryTracer> {
        let connection = self.database.clone()?;
        Some(QueryTracer::new(hub.clone(), parent?, connection))
    }
}

/// A JSON value as a scope context; non-objects are wrapped as `value`.
pub(crate) fn object_context(value: Value) -> Context {
    match value {
        Value::Object(map) => Context::Other(map.into_iter().collect()),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Context::Other(map)
        }
    }
}
