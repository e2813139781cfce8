//! Database query instrumentation.
//!
//! # Responsibilities
//! - Describe the connection the spans are tagged with
//! - Wrap statement execution in one `db` span plus a `query` breadcrumb
//! - Offer an execute hook that database handles route through
//!
//! # Design Decisions
//! - Errors from the statement pass through unchanged, after the span closes
//! - Tracing is opt-in per handle (`Traced::new`), no global patching

pub mod tracer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::monitor::MonitorScope;

pub use tracer::QueryTracer;

/// Connection metadata attached to every query span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionInfo {
    /// Database system, e.g. "postgresql".
    pub vendor: String,
    pub name: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConnectionInfo {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            ..Self::default()
        }
    }
}

/// One statement as handed to the execute hook.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<'a> {
    pub sql: &'a str,
    pub params: serde_json::Value,
    /// Executed once per parameter set.
    pub many: bool,
}

impl<'a> Statement<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self {
            sql,
            params: serde_json::Value::Null,
            many: false,
        }
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }
}

/// A database handle that executes statements.
#[async_trait]
pub trait Execute: Send + Sync {
    type Output: Send;
    type Error: Send;

    async fn execute(&self, statement: &Statement<'_>) -> Result<Self::Output, Self::Error>;
}

/// Routes an [`Execute`] handle through the scope's query tracer.
///
/// Without a tracer (no database configured) statements run untraced.
pub struct Traced<'a, C> {
    inner: &'a C,
    tracer: Option<&'a QueryTracer>,
}

impl<'a, C: Execute> Traced<'a, C> {
    pub fn new(inner: &'a C, scope: &'a MonitorScope) -> Self {
        Self {
            inner,
            tracer: scope.queries(),
        }
    }
}

#[async_trait]
impl<C: Execute> Execute for Traced<'_, C> {
    type Output = C::Output;
    type Error = C::Error;

    async fn execute(&self, statement: &Statement<'_>) -> Result<Self::Output, Self::Error> {
        match self.tracer {
            Some(tracer) => {
                tracer
                    .trace_async(statement, self.inner.execute(statement))
                    .await
            }
            None => self.inner.execute(statement).await,
        }
    }
}
